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

//! error definitions
use nix::errno::Errno;
use snafu::prelude::*;
#[allow(unused_imports)]
pub use snafu::ResultExt;

#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Io: {}", source))]
    Io { source: std::io::Error },

    #[snafu(display("Errno: {}", source))]
    Nix { source: nix::Error },
}

impl Error {
    /// Translate the basic error to error number.
    pub fn get_errno(&self) -> i32 {
        match self {
            Error::Io { source } => source.raw_os_error().unwrap_or(Errno::EIO as i32),
            Error::Nix { source } => *source as i32,
        }
    }

    /// The errno carried by this error, as a nix Errno.
    pub fn errno(&self) -> Errno {
        Errno::from_i32(self.get_errno())
    }
}

///
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// seven errno for "operation, system call, ioctl or socket feature not supported"
pub fn errno_is_not_supported(source: Errno) -> bool {
    matches!(
        source,
        Errno::EOPNOTSUPP
            | Errno::ENOTTY
            | Errno::ENOSYS
            | Errno::EAFNOSUPPORT
            | Errno::EPFNOSUPPORT
            | Errno::EPROTONOSUPPORT
            | Errno::ESOCKTNOSUPPORT
    )
}

/// two errno for access problems
pub fn errno_is_privilege(source: Errno) -> bool {
    matches!(source, Errno::EACCES | Errno::EPERM)
}
