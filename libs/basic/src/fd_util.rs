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

//! descriptor flag helpers
use crate::error::*;
use nix::fcntl::{FcntlArg, FdFlag, OFlag};
use std::os::unix::prelude::RawFd;

/// switch O_NONBLOCK on or off
pub fn fd_nonblock(fd: RawFd, nonblock: bool) -> Result<()> {
    assert!(fd >= 0);

    let flags = nix::fcntl::fcntl(fd, FcntlArg::F_GETFL).context(NixSnafu)?;
    let fd_flag = OFlag::from_bits_truncate(flags);

    let nflag = match nonblock {
        true => fd_flag | OFlag::O_NONBLOCK,
        false => fd_flag & !OFlag::O_NONBLOCK,
    };

    if nflag == fd_flag {
        return Ok(());
    }

    nix::fcntl::fcntl(fd, FcntlArg::F_SETFL(nflag)).context(NixSnafu)?;

    Ok(())
}

/// switch FD_CLOEXEC on or off
pub fn fd_cloexec(fd: RawFd, cloexec: bool) -> Result<()> {
    assert!(fd >= 0);

    let flags = nix::fcntl::fcntl(fd, FcntlArg::F_GETFD).context(NixSnafu)?;
    let fd_flag = FdFlag::from_bits_truncate(flags);

    let nflag = match cloexec {
        true => fd_flag | FdFlag::FD_CLOEXEC,
        false => fd_flag & !FdFlag::FD_CLOEXEC,
    };

    nix::fcntl::fcntl(fd, FcntlArg::F_SETFD(nflag)).context(NixSnafu)?;

    Ok(())
}

///
pub fn fd_is_cloexec(fd: RawFd) -> bool {
    assert!(fd >= 0);

    let flags = nix::fcntl::fcntl(fd, FcntlArg::F_GETFD).unwrap_or(0);
    FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC)
}

///
pub fn fd_is_nonblock(fd: RawFd) -> bool {
    assert!(fd >= 0);

    let flags = nix::fcntl::fcntl(fd, FcntlArg::F_GETFL).unwrap_or(0);
    OFlag::from_bits_truncate(flags).contains(OFlag::O_NONBLOCK)
}

/// whether fd refers to an open descriptor of this process
pub fn fd_is_valid(fd: RawFd) -> bool {
    if fd < 0 {
        return false;
    }

    nix::fcntl::fcntl(fd, FcntlArg::F_GETFD).is_ok()
}

///
pub fn close(fd: RawFd) {
    if let Err(e) = nix::unistd::close(fd) {
        log::warn!("close fd {} failed, errno: {}", fd, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs::File, os::unix::prelude::IntoRawFd};

    #[test]
    fn test_fd_flags() {
        let fd = File::open("/dev/null").unwrap().into_raw_fd();
        assert!(fd_is_valid(fd));

        // std opens files with O_CLOEXEC
        assert!(fd_is_cloexec(fd));
        fd_cloexec(fd, false).unwrap();
        assert!(!fd_is_cloexec(fd));
        fd_cloexec(fd, true).unwrap();
        assert!(fd_is_cloexec(fd));

        assert!(!fd_is_nonblock(fd));
        fd_nonblock(fd, true).unwrap();
        assert!(fd_is_nonblock(fd));
        fd_nonblock(fd, false).unwrap();
        assert!(!fd_is_nonblock(fd));

        close(fd);
    }

    #[test]
    fn test_fd_is_valid_negative() {
        assert!(!fd_is_valid(-1));
    }
}
