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

//! filesystem helpers for socket files
use crate::error::*;
use nix::{
    errno::Errno,
    sys::stat::{self, Mode, SFlag},
};
use std::{fs, path::Path};

/// Restores the saved process umask when dropped.
struct UmaskGuard {
    old_mask: Mode,
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        stat::umask(self.old_mask);
    }
}

/// Run f with the process umask set to mask, then restore the previous
/// umask, whether f fails or not.
///
/// The umask is process wide: callers must not create files concurrently
/// from other threads while f runs.
pub fn with_umask<T, F>(mask: u32, f: F) -> T
where
    F: FnOnce() -> T,
{
    let old_mask = stat::umask(Mode::from_bits_truncate(mask as libc::mode_t));
    let _guard = UmaskGuard { old_mask };
    f()
}

/// Check whether path exists and is a socket file, without following
/// symlinks.
///
/// Returns Nix ENOENT if nothing exists at path.
pub fn is_socket_file(path: &Path) -> Result<bool> {
    let st = stat::lstat(path).context(NixSnafu)?;
    let fmt = SFlag::from_bits_truncate(st.st_mode & SFlag::S_IFMT.bits());
    Ok(fmt == SFlag::S_IFSOCK)
}

/// Make sure the parent directory of path exists.
pub fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).context(IoSnafu)
        }
        _ => Ok(()),
    }
}

/// Unlink path, a missing entry is not an error.
pub fn unlink_if_exists(path: &Path) -> Result<()> {
    match nix::unistd::unlink(path) {
        Ok(_) | Err(Errno::ENOENT) => Ok(()),
        Err(e) => Err(Error::Nix { source: e }),
    }
}
