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

//! socket creation and socket option helpers
use crate::error::*;
use nix::{
    errno::Errno,
    sys::socket::{self, sockopt, SockaddrLike, SockaddrStorage},
};
use std::{ffi::CString, os::unix::prelude::RawFd, path::Path, sync::Mutex};

///
pub fn ipv6_is_supported() -> bool {
    let inet6 = Path::new("/proc/net/if_inet6");

    if inet6.exists() {
        return true;
    }

    false
}

/// Create a socket that stays open across exec.
///
/// The protocol is passed to the kernel untouched, so any protocol number
/// the platform knows can be used.
pub fn socket_inheritable(family: i32, sock_type: i32, protocol: i32) -> Result<RawFd> {
    let fd = unsafe { libc::socket(family, sock_type, protocol) };
    Errno::result(fd).context(NixSnafu)
}

// getprotobyname returns a pointer into static storage
static PROTO_DB: Mutex<()> = Mutex::new(());

/// Look name up in the protocol database of the OS (/etc/protocols).
pub fn protocol_by_name(name: &str) -> Option<i32> {
    let cname = CString::new(name).ok()?;
    let _guard = PROTO_DB.lock().unwrap_or_else(|e| e.into_inner());

    let entry = unsafe { libc::getprotobyname(cname.as_ptr()) };
    if entry.is_null() {
        return None;
    }
    Some(unsafe { (*entry).p_proto })
}

///
pub fn set_reuse_addr(fd: RawFd, v: bool) -> Result<()> {
    socket::setsockopt(fd, sockopt::ReuseAddr, &v).context(NixSnafu)
}

///
pub fn set_reuse_port(fd: RawFd, v: bool) -> Result<()> {
    socket::setsockopt(fd, sockopt::ReusePort, &v).context(NixSnafu)
}

/// Restrict the socket to the network interface named interface.
#[cfg(any(target_os = "android", target_os = "linux"))]
pub fn set_bind_to_device(fd: RawFd, interface: &str) -> Result<()> {
    let device = std::ffi::OsString::from(interface);
    socket::setsockopt(fd, sockopt::BindToDevice, &device).context(NixSnafu)
}

/// Restrict the socket to the network interface named interface.
#[cfg(not(any(target_os = "android", target_os = "linux")))]
pub fn set_bind_to_device(_fd: RawFd, _interface: &str) -> Result<()> {
    Err(Error::Nix {
        source: Errno::ENOPROTOOPT,
    })
}

///
pub fn bind(fd: RawFd, addr: &dyn SockaddrLike) -> Result<()> {
    socket::bind(fd, addr).context(NixSnafu)
}

///
pub fn listen(fd: RawFd, backlog: usize) -> Result<()> {
    socket::listen(fd, backlog).context(NixSnafu)
}

/// Get the local port the socket is bound to, 0 for non inet sockets.
pub fn local_port(fd: RawFd) -> Result<u16> {
    let addr = socket::getsockname::<SockaddrStorage>(fd).context(NixSnafu)?;

    if let Some(v4) = addr.as_sockaddr_in() {
        return Ok(v4.port());
    }

    if let Some(v6) = addr.as_sockaddr_in6() {
        return Ok(v6.port());
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd_util;
    use nix::sys::socket::SockaddrIn;
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn test_socket_inheritable() {
        let fd = socket_inheritable(libc::AF_INET, libc::SOCK_STREAM, 0).unwrap();
        assert!(fd >= 0);
        assert!(!fd_util::fd_is_cloexec(fd));

        set_reuse_addr(fd, true).unwrap();
        assert!(socket::getsockopt(fd, sockopt::ReuseAddr).unwrap());

        let addr = SockaddrIn::from(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        bind(fd, &addr).unwrap();
        listen(fd, 16).unwrap();
        assert_ne!(local_port(fd).unwrap(), 0);
        assert!(socket::getsockopt(fd, sockopt::AcceptConn).unwrap());

        fd_util::close(fd);
    }

    #[test]
    fn test_protocol_by_name() {
        assert_eq!(protocol_by_name("no-such-protocol"), None);
        assert_eq!(protocol_by_name("bad\0name"), None);
        if Path::new("/etc/protocols").exists() {
            assert_eq!(protocol_by_name("tcp"), Some(libc::IPPROTO_TCP));
        }
    }

    #[test]
    fn test_unknown_protocol() {
        let ret = socket_inheritable(libc::AF_INET, libc::SOCK_STREAM, 253);
        assert!(ret.is_err());
    }

    #[test]
    fn test_local_port_unix() {
        let fd = socket_inheritable(libc::AF_UNIX, libc::SOCK_STREAM, 0).unwrap();
        assert_eq!(local_port(fd).unwrap(), 0);
        fd_util::close(fd);
    }
}
