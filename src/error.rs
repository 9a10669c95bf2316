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

//! Error define, the socket activation core uses one Error for all of its
//! modules. Configuration problems are always reported before any OS
//! resource is created, bind problems carry the errno of the failing call.

/// Reuse the Errno from the nix library.
pub use nix::errno::Errno;
use snafu::prelude::*;
#[allow(unused_imports)]
pub use snafu::ResultExt;

#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid socket configuration: {}", what))]
    Configuration { what: String },

    #[snafu(display("Protocol not found: '{}'", proto))]
    UnknownProtocol { proto: String },

    #[snafu(display("Socket '{}' already exists", name))]
    DuplicateName { name: String },

    #[snafu(display("Socket '{}' not found", name))]
    NotFound { name: String },

    #[snafu(display("Could not bind socket '{}' at {}: {}", name, addr, source))]
    Bind {
        name: String,
        addr: String,
        source: nix::Error,
    },

    #[snafu(display("Unsupported on this platform: {}", what))]
    PlatformUnsupported { what: String },

    #[snafu(display("Confique error: {}", source))]
    Confique { source: confique::Error },

    #[snafu(display("UtilError: {}", source))]
    Util { source: basic::Error },
}

impl Error {
    /// Whether the error comes from bad configuration rather than from the
    /// OS refusing an operation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::UnknownProtocol { .. }
                | Error::DuplicateName { .. }
                | Error::Confique { .. }
        )
    }

    /// Translate the error to error number.
    pub fn get_errno(&self) -> i32 {
        match self {
            Error::Configuration { what: _ } => Errno::EINVAL as i32,
            Error::UnknownProtocol { proto: _ } => Errno::EPROTONOSUPPORT as i32,
            Error::DuplicateName { name: _ } => Errno::EEXIST as i32,
            Error::NotFound { name: _ } => Errno::ENOENT as i32,
            Error::Bind { source, .. } => *source as i32,
            Error::PlatformUnsupported { what: _ } => Errno::EOPNOTSUPP as i32,
            Error::Confique { source: _ } => Errno::EINVAL as i32,
            Error::Util { source } => source.get_errno(),
        }
    }
}

impl From<basic::Error> for Error {
    fn from(e: basic::Error) -> Error {
        Error::Util { source: e }
    }
}

///
pub type Result<T, E = Error> = std::result::Result<T, E>;
