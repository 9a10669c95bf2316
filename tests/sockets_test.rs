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

mod common;

use nix::sys::socket::{self, sockopt};
use sockact::{Error, SocketConf, SocketFamily, SocketRegistry, SocketType};
use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    os::unix::{fs::PermissionsExt, prelude::FromRawFd},
    process::Command,
};

#[test]
fn sockets_test_load_and_bind() {
    common::init_logger();

    let mut registry = SocketRegistry::load(&[common::test_unit("sockets.toml")]).unwrap();
    assert_eq!(registry.names(), vec!["web", "metrics"]);

    let web = registry.get("web").unwrap();
    assert_eq!(web.family(), SocketFamily::Inet);
    assert_eq!(web.proto(), 6);
    assert_eq!(web.backlog(), 64);
    let metrics = registry.get("metrics").unwrap();
    assert_eq!(metrics.sock_type(), SocketType::Datagram);
    assert_eq!(metrics.proto(), 17);

    registry.bind_and_listen_all().unwrap();
    for s in registry.iter() {
        assert!(s.is_bound());
        assert_ne!(s.port(), 0);
    }

    let vars = registry.env_vars();
    assert_eq!(vars.len(), 3);
    assert_eq!(vars[2], ("LISTEN_FDNAMES".to_string(), "web:metrics".to_string()));

    registry.close_all();
    assert!(registry.fds().is_empty());
}

#[test]
fn sockets_test_worker_rewraps_descriptor() {
    common::init_logger();

    let mut registry = SocketRegistry::new();
    registry
        .add(&SocketConf::new("echo").host("127.0.0.1").blocking(true))
        .unwrap();
    registry.bind_and_listen_all().unwrap();

    let socket = registry.get("echo").unwrap();
    let port = socket.port();
    let fd = nix::unistd::dup(socket.fd().unwrap()).unwrap();

    // what a worker does with the descriptor it inherited
    let listener = unsafe { TcpListener::from_raw_fd(fd) };
    let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
    client.write_all(b"ping").unwrap();

    let (mut conn, _) = listener.accept().unwrap();
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ping");
}

#[cfg(target_os = "linux")]
#[test]
fn sockets_test_descriptor_survives_exec() {
    common::init_logger();

    let mut registry = SocketRegistry::new();
    registry
        .add(&SocketConf::new("web").host("127.0.0.1"))
        .unwrap();
    registry.bind_and_listen_all().unwrap();

    let status = Command::new("sh")
        .arg("-c")
        .arg("test -S /proc/self/fd/$LISTEN_FD_WEB")
        .envs(registry.env_vars())
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn sockets_test_unix_lifecycle() {
    common::init_logger();

    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public.sock");
    let private = dir.path().join("private.sock");

    let mut registry = SocketRegistry::new();
    registry
        .add(&SocketConf::new("public").path(&public).umask(0))
        .unwrap();
    registry
        .add(&SocketConf::new("private").path(&private).umask(0o077))
        .unwrap();
    registry.bind_and_listen_all().unwrap();

    let mode = |p: &std::path::Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&public), 0o777);
    assert_eq!(mode(&private), 0o700);
    let public_fd = registry.get("public").unwrap().fd().unwrap();
    assert!(socket::getsockopt(public_fd, sockopt::AcceptConn).unwrap());

    registry.close_all();
    assert!(!public.exists());
    assert!(!private.exists());
}

#[test]
fn sockets_test_failed_startup_leaves_nothing() {
    common::init_logger();

    let dir = tempfile::tempdir().unwrap();
    let sockfile = dir.path().join("first.sock");
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let busy = occupied.local_addr().unwrap().port();

    let mut registry = SocketRegistry::from_confs(&[
        SocketConf::new("first").path(&sockfile),
        SocketConf::new("second").host("127.0.0.1"),
        SocketConf::new("busy").host("127.0.0.1").port(busy),
    ])
    .unwrap();

    let e = registry.bind_and_listen_all().unwrap_err();
    assert!(matches!(e, Error::Bind { .. }));
    assert!(!e.is_configuration());
    assert!(registry.iter().all(|s| !s.is_bound()));
    assert!(!sockfile.exists());
}

#[test]
fn sockets_test_unknown_proto_creates_nothing() {
    let e = SocketRegistry::from_confs(&[SocketConf::new("").proto("foo")]).unwrap_err();
    assert!(e.is_configuration());
}
