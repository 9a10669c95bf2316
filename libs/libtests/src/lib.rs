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

//! This crate provides common functions for unit tests
use std::{
    env,
    io::{self, ErrorKind},
    path::PathBuf,
};

/// get the source project root path
pub fn get_project_root() -> io::Result<PathBuf> {
    let path = env::current_dir()?;
    let mut current_path = Some(path.as_path());

    while let Some(p) = current_path {
        let has_cargo = p.read_dir()?.any(|p| {
            if let Ok(entry) = p {
                entry.file_name().eq("Cargo.lock")
            } else {
                false
            }
        });

        if has_cargo {
            return Ok(p.into());
        }

        current_path = p.parent();
    }

    Err(io::Error::new(ErrorKind::NotFound, "NotFound"))
}

/// get the directory holding the socket unit fixtures
pub fn get_test_units_dir() -> io::Result<PathBuf> {
    let dir = get_project_root()?.join("tests").join("test_units");

    if !dir.is_dir() {
        return Err(io::Error::new(
            ErrorKind::NotFound,
            format!("{:?} does not exist", dir),
        ));
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use crate::get_project_root;

    #[test]
    fn test_get_project_root() {
        let mut file_path = get_project_root().unwrap();
        file_path.push("Cargo.toml");

        assert!(file_path.is_file());
    }
}
