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

//! socket implement one named listening endpoint: create, bind, listen and
//! close the descriptor, and clean up the unix-domain socket file it created.
//!

use crate::{
    base::{self, SocketFamily, SocketType},
    config::SocketConf,
    error::*,
    sockopt::{SockOpt, SockOptOutcome, SystemSockOpt},
};
use basic::{errno_is_privilege, fd_util, fs_util, socket_util};
use nix::sys::socket::{SockaddrIn, SockaddrIn6, SockaddrLike, UnixAddr};
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, ToSocketAddrs},
    os::unix::prelude::RawFd,
    path::{Path, PathBuf},
};

pub(crate) const SOCKET_INVALID_FD: RawFd = -1;

/// listen queue depth when the configuration gives none
pub const DEFAULT_BACKLOG: usize = 128;
/// host of network sockets when the configuration gives none
pub const DEFAULT_HOST: &str = "localhost";

/// A named socket. It owns its descriptor once bound and the socket file
/// at `path` once it created it.
pub struct Socket {
    // configured
    name: String,
    host: String,
    port: u16,
    family: SocketFamily,
    sock_type: SocketType,
    proto: i32,
    path: Option<PathBuf>,
    umask: Option<u32>,
    interface: Option<String>,
    backlog: usize,
    replace: bool,
    so_reuseport: bool,
    blocking: bool,

    // owned objects
    fd: RawFd,
    resolved_port: u16,
    owns_path: bool,
}

impl Socket {
    /// Build an unbound socket from a configuration record. No OS resource
    /// is touched.
    pub fn load_from_config(conf: &SocketConf) -> Result<Socket> {
        let sock_type = match &conf.sock_type {
            Some(t) => t.parse::<SocketType>()?,
            None => SocketType::default(),
        };
        let proto = base::parse_protocol_value(conf.proto.as_ref())?;

        let path = match conf.path.as_deref() {
            Some("") => {
                return Err(Error::Configuration {
                    what: format!("socket '{}' has an empty path", conf.name),
                })
            }
            Some(p) => Some(PathBuf::from(p)),
            None => None,
        };

        let family = match (&path, &conf.family) {
            (Some(_), _) => SocketFamily::Unix,
            (None, Some(f)) => f.parse::<SocketFamily>()?,
            (None, None) => SocketFamily::Inet,
        };
        if family == SocketFamily::Unix && path.is_none() {
            return Err(Error::Configuration {
                what: format!("unix socket '{}' requires a path", conf.name),
            });
        }

        if conf.name.is_empty() {
            return Err(Error::Configuration {
                what: "socket name is required".to_string(),
            });
        }

        let socket = Socket {
            name: conf.name.clone(),
            host: conf
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: base::parse_port(conf.port.as_ref())?,
            family,
            sock_type,
            proto,
            path,
            umask: base::parse_umask(conf.umask.as_ref())?,
            interface: conf.interface.clone().filter(|v| !v.is_empty()),
            backlog: base::parse_backlog(conf.backlog.as_ref(), DEFAULT_BACKLOG)?,
            replace: conf.replace.unwrap_or(true),
            so_reuseport: conf.so_reuseport.unwrap_or(false),
            blocking: conf.blocking.unwrap_or(false),

            fd: SOCKET_INVALID_FD,
            resolved_port: 0,
            owns_path: false,
        };
        log::debug!(
            "load {}, family: {}, type: {}, protocol: {}",
            socket,
            family,
            sock_type,
            proto
        );

        Ok(socket)
    }

    /// Bind and listen using the platform's socket options.
    pub fn bind_and_listen(&mut self) -> Result<()> {
        self.bind_and_listen_with(&SystemSockOpt)
    }

    /// Bind and listen, applying platform socket options through sockopt.
    ///
    /// On failure the socket is left without descriptor and without socket
    /// file.
    pub fn bind_and_listen_with(&mut self, sockopt: &dyn SockOpt) -> Result<()> {
        // process reentrant protection
        if self.is_bound() {
            log::debug!("{} is already bound, fd: {}", self, self.fd);
            return Ok(());
        }

        log::debug!(
            "create socket {}, family: {}, type: {}, protocol: {}",
            self.name,
            self.family,
            self.sock_type,
            self.proto
        );
        let fd = socket_util::socket_inheritable(
            self.family.as_raw(),
            self.sock_type.as_raw(),
            self.proto,
        )
        .map_err(|e| self.bind_error(e.errno()))?;

        let port = match self.setup(fd, sockopt) {
            Ok(v) => v,
            Err(e) => {
                log::error!("Could not bind {}: {}", self.location(), e);
                if errno_is_privilege(Errno::from_i32(e.get_errno())) {
                    log::error!("{} requires privileges this process lacks", self.location());
                }
                fd_util::close(fd);
                self.remove_path();
                return Err(e);
            }
        };

        self.fd = fd;
        self.resolved_port = port;
        log::info!("Socket bound at {} - fd: {}", self.location(), fd);

        Ok(())
    }

    fn setup(&mut self, fd: RawFd, sockopt: &dyn SockOpt) -> Result<u16> {
        if self.family.is_network() {
            socket_util::set_reuse_addr(fd, true).map_err(|e| self.bind_error(e.errno()))?;
            if self.so_reuseport {
                socket_util::set_reuse_port(fd, true).map_err(|e| self.bind_error(e.errno()))?;
            }
            self.apply_interface(fd, sockopt)?;

            let addr = self.sock_addr().map_err(|e| self.bind_error(e))?;
            socket_util::bind(fd, &*addr).map_err(|e| self.bind_error(e.errno()))?;
        } else {
            self.bind_unix(fd)?;
        }

        if self.sock_type.can_listen() {
            socket_util::listen(fd, self.backlog).map_err(|e| self.bind_error(e.errno()))?;
        }

        // the descriptor is handed over to spawned workers
        fd_util::fd_cloexec(fd, false).map_err(|e| self.bind_error(e.errno()))?;
        fd_util::fd_nonblock(fd, !self.blocking).map_err(|e| self.bind_error(e.errno()))?;

        if !self.family.is_network() {
            return Ok(0);
        }

        let port = socket_util::local_port(fd).map_err(|e| self.bind_error(e.errno()))?;
        if port == 0 {
            return Err(self.bind_error(Errno::EADDRNOTAVAIL));
        }
        Ok(port)
    }

    fn apply_interface(&self, fd: RawFd, sockopt: &dyn SockOpt) -> Result<()> {
        let interface = match &self.interface {
            None => return Ok(()),
            Some(v) => v,
        };

        match sockopt.bind_to_device(fd, interface) {
            SockOptOutcome::Applied => {
                log::debug!("Binding {} to device: {}", self.name, interface);
                Ok(())
            }
            SockOptOutcome::Unsupported => Err(Error::PlatformUnsupported {
                what: format!(
                    "binding socket '{}' to interface '{}'",
                    self.name, interface
                ),
            }),
            SockOptOutcome::Failed(e) => Err(self.bind_error(e)),
        }
    }

    fn bind_unix(&mut self, fd: RawFd) -> Result<()> {
        let path = match &self.path {
            Some(v) => v.clone(),
            None => return Err(self.bind_error(Errno::EINVAL)),
        };

        fs_util::create_parent_dir(&path).map_err(|e| self.bind_error(e.errno()))?;

        match fs_util::is_socket_file(&path) {
            Err(e) if e.errno() == Errno::ENOENT => {}
            Err(e) => return Err(self.bind_error(e.errno())),
            Ok(true) if self.replace => {
                log::debug!("Removing stale socket file {:?}", path);
                fs_util::unlink_if_exists(&path).map_err(|e| self.bind_error(e.errno()))?;
            }
            Ok(_) => {
                log::error!(
                    "{:?} already exists. If it's a stale socket file, enable replace",
                    path
                );
                return Err(self.bind_error(Errno::EADDRINUSE));
            }
        }

        let addr = UnixAddr::new(path.as_path()).map_err(|e| self.bind_error(e))?;
        let ret = match self.umask {
            Some(mask) => fs_util::with_umask(mask, || socket_util::bind(fd, &addr)),
            None => socket_util::bind(fd, &addr),
        };
        ret.map_err(|e| self.bind_error(e.errno()))?;
        self.owns_path = true;

        Ok(())
    }

    fn sock_addr(&self) -> Result<Box<dyn SockaddrLike>, Errno> {
        if self.host.is_empty() || self.host == "*" {
            let addr: Box<dyn SockaddrLike> = match self.family {
                SocketFamily::Inet6 => Box::new(SockaddrIn6::from(SocketAddrV6::new(
                    Ipv6Addr::UNSPECIFIED,
                    self.port,
                    0,
                    0,
                ))),
                _ => Box::new(SockaddrIn::from(SocketAddrV4::new(
                    Ipv4Addr::UNSPECIFIED,
                    self.port,
                ))),
            };
            return Ok(addr);
        }

        let candidates = match self.host.parse::<IpAddr>() {
            Ok(ip) => vec![SocketAddr::new(ip, self.port)],
            Err(_) => (self.host.as_str(), self.port)
                .to_socket_addrs()
                .map_err(|e| {
                    log::error!("Failed to resolve host {}: {}", self.host, e);
                    Errno::EADDRNOTAVAIL
                })?
                .collect(),
        };

        for addr in candidates {
            match (self.family, addr) {
                (SocketFamily::Inet, SocketAddr::V4(v4)) => {
                    return Ok(Box::new(SockaddrIn::from(v4)))
                }
                (SocketFamily::Inet6, SocketAddr::V6(v6)) => {
                    return Ok(Box::new(SockaddrIn6::from(v6)))
                }
                _ => continue,
            }
        }

        log::error!("Host {} has no {} address", self.host, self.family);
        Err(Errno::EADDRNOTAVAIL)
    }

    /// Close the descriptor and remove the socket file this socket created.
    /// Closing an unbound socket does nothing.
    pub fn close(&mut self) {
        if self.fd >= 0 {
            log::debug!("Closing {} - fd: {}", self, self.fd);
            fd_util::close(self.fd);
            self.fd = SOCKET_INVALID_FD;
            self.resolved_port = 0;
        }

        self.remove_path();
    }

    fn remove_path(&mut self) {
        if !self.owns_path {
            return;
        }

        if let Some(path) = &self.path {
            log::debug!("unlink path: {:?}", path);
            if let Err(e) = fs_util::unlink_if_exists(path) {
                log::warn!("Unable to unlink {:?}, error: {}", path, e);
            }
        }
        self.owns_path = false;
    }

    fn bind_error(&self, source: Errno) -> Error {
        Error::Bind {
            name: self.name.clone(),
            addr: self.location(),
            source,
        }
    }

    /// where the socket is (or will be) bound
    pub fn location(&self) -> String {
        match (&self.path, self.family) {
            (Some(path), _) => format!("unix:{}", path.display()),
            (None, SocketFamily::Inet6) => format!("[{}]:{}", self.host, self.port()),
            (None, _) => format!("{}:{}", self.host, self.port()),
        }
    }

    ///
    pub fn name(&self) -> &str {
        &self.name
    }

    ///
    pub fn host(&self) -> &str {
        &self.host
    }

    /// the bound port once bound, the requested one before
    pub fn port(&self) -> u16 {
        if self.is_bound() && self.family.is_network() {
            return self.resolved_port;
        }
        self.port
    }

    /// the port found in the configuration
    pub fn requested_port(&self) -> u16 {
        self.port
    }

    ///
    pub fn family(&self) -> SocketFamily {
        self.family
    }

    ///
    pub fn sock_type(&self) -> SocketType {
        self.sock_type
    }

    ///
    pub fn proto(&self) -> i32 {
        self.proto
    }

    ///
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    ///
    pub fn umask(&self) -> Option<u32> {
        self.umask
    }

    ///
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    ///
    pub fn backlog(&self) -> usize {
        self.backlog
    }

    /// the live descriptor
    pub fn fd(&self) -> Option<RawFd> {
        if self.fd >= 0 {
            return Some(self.fd);
        }
        None
    }

    ///
    pub fn is_bound(&self) -> bool {
        self.fd >= 0
    }

    /// whether close() will remove the file at path
    pub fn owns_path(&self) -> bool {
        self.owns_path
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "socket '{}' at {}", self.name, self.location())
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Socket")
            .field("name", &self.name)
            .field("location", &self.location())
            .field("family", &self.family)
            .field("type", &self.sock_type)
            .field("proto", &self.proto)
            .field("fd", &self.fd)
            .finish()
    }
}
