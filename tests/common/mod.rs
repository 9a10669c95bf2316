// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

use std::path::PathBuf;

/// Install the console logger once for the whole test binary.
pub fn init_logger() {
    basic::logger::init_log_to_console("sockets_test", log::LevelFilter::Debug);
}

/// The TOML fixture called name.
pub fn test_unit(name: &str) -> PathBuf {
    libtests::get_test_units_dir()
        .expect("tests/test_units is missing")
        .join(name)
}
