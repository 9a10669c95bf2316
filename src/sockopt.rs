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

//! Platform dependent socket options, kept behind a trait so that callers
//! and tests can substitute the outcome without real sockets.

use basic::{errno_is_not_supported, socket_util};
use nix::errno::Errno;
use std::os::unix::prelude::RawFd;

/// outcome of applying a platform socket option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockOptOutcome {
    /// the option is set
    Applied,
    /// the platform does not offer the option
    Unsupported,
    /// the option exists but setting it failed
    Failed(Errno),
}

/// Platform socket options used while binding.
pub trait SockOpt: Send + Sync {
    /// restrict fd to the network interface named interface
    fn bind_to_device(&self, fd: RawFd, interface: &str) -> SockOptOutcome;
}

/// The real options of the running platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSockOpt;

impl SockOpt for SystemSockOpt {
    #[cfg(any(target_os = "android", target_os = "linux"))]
    fn bind_to_device(&self, fd: RawFd, interface: &str) -> SockOptOutcome {
        match socket_util::set_bind_to_device(fd, interface) {
            Ok(()) => SockOptOutcome::Applied,
            Err(e) => {
                let errno = e.errno();
                if errno_is_not_supported(errno) || errno == Errno::ENOPROTOOPT {
                    SockOptOutcome::Unsupported
                } else {
                    SockOptOutcome::Failed(errno)
                }
            }
        }
    }

    #[cfg(not(any(target_os = "android", target_os = "linux")))]
    fn bind_to_device(&self, _fd: RawFd, _interface: &str) -> SockOptOutcome {
        SockOptOutcome::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basic::fd_util;

    #[test]
    fn test_bind_to_unknown_device() {
        let fd = socket_util::socket_inheritable(libc::AF_INET, libc::SOCK_STREAM, 0).unwrap();

        let ret = SystemSockOpt.bind_to_device(fd, "no-such-if0");
        // unprivileged callers get EPERM, privileged ones ENODEV
        assert_ne!(ret, SockOptOutcome::Applied);

        fd_util::close(fd);
    }
}
