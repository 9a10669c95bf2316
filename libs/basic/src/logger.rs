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

//! console logger
use log::{LevelFilter, Log};
use std::io::Write;

fn write_msg_common(writer: &mut impl Write, name: &str, module: &str, msg: String) {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    /* time, program, module, message */
    if let Err(e) = writeln!(writer, "{} {} {} {}", now, name, module, msg) {
        eprintln!("Failed to log message: {}", e);
    }
}

struct ConsoleLogger {
    name: String,
    level: LevelFilter,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let module_path = match record.module_path() {
            None => "unknown",
            Some(v) => v,
        };
        let mut stdout = std::io::stdout().lock();
        write_msg_common(
            &mut stdout,
            &self.name,
            module_path,
            format!("[{}] {}", record.level(), record.args()),
        );
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Initialize the console logger. Only the first call installs a logger,
/// later calls just change the max level.
pub fn init_log_to_console(name: &str, level: LevelFilter) {
    let logger = ConsoleLogger {
        name: name.to_string(),
        level,
    };
    if log::set_boxed_logger(Box::new(logger)).is_err() {
        log::debug!("logger already initialized");
    }
    log::set_max_level(level);
}
