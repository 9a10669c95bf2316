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

//! The registry owns the named sockets of a supervisor. Bulk binding is all
//! or nothing, bulk closing is best effort.

use crate::{
    config::{SocketConf, SocketsConfig},
    error::*,
    export::env_key,
    socket::Socket,
    sockopt::{SockOpt, SystemSockOpt},
};
use std::{fmt, path::PathBuf};

/// Ordered, name keyed collection of sockets. Insertion order is the order
/// in which descriptors are bound and exported to workers.
///
/// The registry is not locked internally: callers serialize
/// bind_and_listen_all, close_all and reload against each other.
pub struct SocketRegistry {
    sockets: Vec<Socket>,
    sockopt: Box<dyn SockOpt>,
}

impl Default for SocketRegistry {
    fn default() -> Self {
        SocketRegistry::new()
    }
}

impl SocketRegistry {
    /// an empty registry using the platform's socket options
    pub fn new() -> SocketRegistry {
        SocketRegistry::with_sockopt(Box::new(SystemSockOpt))
    }

    /// an empty registry applying platform socket options through sockopt
    pub fn with_sockopt(sockopt: Box<dyn SockOpt>) -> SocketRegistry {
        SocketRegistry {
            sockets: Vec::new(),
            sockopt,
        }
    }

    /// Build a registry from configuration records, in order.
    pub fn from_confs(confs: &[SocketConf]) -> Result<SocketRegistry> {
        let mut registry = SocketRegistry::new();
        registry.sockets = build_sockets(confs)?;
        Ok(registry)
    }

    /// Build a registry from the `[[Socket]]` tables of TOML files.
    pub fn load(paths: &[PathBuf]) -> Result<SocketRegistry> {
        let config = SocketsConfig::load(paths)?;
        SocketRegistry::from_confs(&config.sockets())
    }

    /// Add a socket. A duplicate name or an invalid record fails before any
    /// OS resource is touched and leaves the registry unchanged. Names that
    /// export under the same variable, like `my-app` and `my_app`, are
    /// duplicates.
    pub fn add(&mut self, conf: &SocketConf) -> Result<&Socket> {
        check_unique(&self.sockets, &conf.name)?;

        let socket = Socket::load_from_config(conf)?;
        log::debug!("add {}", socket);
        self.sockets.push(socket);

        Ok(&self.sockets[self.sockets.len() - 1])
    }

    ///
    pub fn get(&self, name: &str) -> Result<&Socket> {
        self.sockets
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    ///
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Socket> {
        self.sockets
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    ///
    pub fn contains(&self, name: &str) -> bool {
        self.sockets.iter().any(|s| s.name() == name)
    }

    /// Close and drop the socket called name.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index = self
            .sockets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })?;

        let mut socket = self.sockets.remove(index);
        socket.close();
        Ok(())
    }

    /// sockets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Socket> {
        self.sockets.iter()
    }

    /// names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.sockets.iter().map(|s| s.name()).collect()
    }

    ///
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    ///
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    /// Bind every socket in insertion order.
    ///
    /// If one of them fails, the sockets bound by this call are closed again
    /// before the error is returned. Sockets that were already bound before
    /// the call are left alone, sockets after the failing one are not
    /// attempted.
    pub fn bind_and_listen_all(&mut self) -> Result<()> {
        let mut bound = Vec::new();
        let mut failure = None;

        for (index, socket) in self.sockets.iter_mut().enumerate() {
            if socket.is_bound() {
                continue;
            }

            if let Err(e) = socket.bind_and_listen_with(self.sockopt.as_ref()) {
                failure = Some(e);
                break;
            }
            bound.push(index);
        }

        let e = match failure {
            None => return Ok(()),
            Some(e) => e,
        };

        log::error!(
            "Failed to bind all sockets, closing {} socket(s) bound so far: {}",
            bound.len(),
            e
        );
        for index in bound {
            self.sockets[index].close();
        }

        Err(e)
    }

    /// Close every socket, never fails.
    pub fn close_all(&mut self) {
        for socket in self.sockets.iter_mut() {
            socket.close();
        }
    }

    /// Replace the sockets by the ones described in confs and bind them.
    ///
    /// The new records are validated first: a configuration error leaves the
    /// current sockets untouched. Otherwise the current sockets are closed
    /// and the new set is bound with the same rule as bind_and_listen_all.
    pub fn reload(&mut self, confs: &[SocketConf]) -> Result<()> {
        let sockets = build_sockets(confs)?;

        log::info!(
            "Reloading sockets, closing {} and binding {}",
            self.sockets.len(),
            sockets.len()
        );
        self.close_all();
        self.sockets = sockets;

        self.bind_and_listen_all()
    }
}

impl fmt::Debug for SocketRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketRegistry")
            .field("names", &self.names())
            .field("sockets", &self.sockets)
            .finish()
    }
}

impl Drop for SocketRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn build_sockets(confs: &[SocketConf]) -> Result<Vec<Socket>> {
    let mut sockets: Vec<Socket> = Vec::with_capacity(confs.len());

    for conf in confs {
        check_unique(&sockets, &conf.name)?;
        sockets.push(Socket::load_from_config(conf)?);
    }

    Ok(sockets)
}

fn check_unique(sockets: &[Socket], name: &str) -> Result<()> {
    let key = env_key(name);
    if let Some(other) = sockets.iter().find(|s| env_key(s.name()) == key) {
        if other.name() != name {
            log::error!("Socket '{}' exports as {} like '{}'", name, key, other.name());
        }
        return Err(Error::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}
