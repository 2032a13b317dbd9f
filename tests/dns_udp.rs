use dns_standalone::{
    ChallengeAction, ChallengeRequest, Config, DynTxtStore, InMemoryTxtStore, Solver,
    StandaloneSolver,
};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use trust_dns_proto::op::{Message, OpCode, Query, ResponseCode};
use trust_dns_proto::rr::{Name, RData, Record, RecordType};

const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

fn config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("GROUP_NAME", "acme.example.org"),
        ("PORT", "0"),
        ("EXTERNAL_SERVER_ADDRESS", "ns.example.org"),
        ("AUTHORITATIVE_ZONE_NAME", "acme.example.org"),
        ("HOSTMASTER_EMAIL_ADDRESS", "hostmaster@example.org"),
    ]);
    Config::try_from_vars(|key| vars.get(key).map(ToString::to_string)).unwrap()
}

struct TestServer {
    solver: Arc<StandaloneSolver>,
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let txt_store: DynTxtStore = Arc::new(InMemoryTxtStore::default());
        let solver = Arc::new(StandaloneSolver::new(Arc::new(config()), txt_store));
        let (stop, stop_rx) = oneshot::channel();
        solver.initialize(stop_rx).await.unwrap();
        let port = solver.dns_addr().unwrap().port();
        TestServer {
            solver,
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            stop,
        }
    }

    async fn shutdown(self) {
        self.stop.send(()).unwrap();
        self.solver.wait_for_shutdown().await;
    }
}

fn challenge(action: ChallengeAction, fqdn: &str, key: &str) -> ChallengeRequest {
    ChallengeRequest {
        uid: String::default(),
        action,
        challenge_type: "dns-01".into(),
        dns_name: String::default(),
        key: key.into(),
        resolved_fqdn: fqdn.into(),
        resolved_zone: String::default(),
    }
}

fn query(name: &str, rtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(0x2a);
    msg.set_recursion_desired(true);
    msg.add_query(Query::query(Name::from_ascii(name).unwrap(), rtype));
    msg
}

async fn send_raw(server: SocketAddr, datagram: &[u8]) -> Option<Message> {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    socket.send_to(datagram, server).await.unwrap();
    let mut buf = vec![0u8; 4096];
    match tokio::time::timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(Message::from_vec(&buf[..len]).unwrap()),
        Ok(Err(_)) | Err(_) => None,
    }
}

async fn exchange(server: SocketAddr, request: &Message) -> Option<Message> {
    send_raw(server, &request.to_vec().unwrap()).await
}

fn txt_strings(record: &Record) -> Vec<String> {
    match record.data() {
        Some(RData::TXT(txt)) => txt
            .txt_data()
            .iter()
            .map(|s| String::from_utf8(s.to_vec()).unwrap())
            .collect(),
        other => panic!("expected TXT rdata, found {other:?}"),
    }
}

#[tokio::test]
async fn present_resolve_clean_up() {
    let server = TestServer::start().await;
    let test_data = [
        ("test1.example.com.", "testkey1"),
        ("test2.example.com.", "testkey2"),
        ("_acme-challenge.test3.example.com.", "testkey3"),
    ];

    for (fqdn, key) in test_data {
        server
            .solver
            .present(&challenge(ChallengeAction::Present, fqdn, key))
            .await
            .unwrap();
    }

    for (fqdn, key) in test_data {
        let name = dns_standalone::solver::challenge_key(fqdn, &config());
        let request = query(&name, RecordType::TXT);
        let response = exchange(server.addr, &request).await.unwrap();
        assert_eq!(response.id(), request.id());
        assert_eq!(response.response_code(), ResponseCode::NoError);
        assert_eq!(response.answers().len(), 1, "answers for {name}");
        assert_eq!(txt_strings(&response.answers()[0]), vec![key.to_string()]);
    }

    for (fqdn, key) in test_data {
        server
            .solver
            .clean_up(&challenge(ChallengeAction::CleanUp, fqdn, key))
            .await
            .unwrap();
    }

    for (fqdn, _) in test_data {
        let name = dns_standalone::solver::challenge_key(fqdn, &config());
        let response = exchange(server.addr, &query(&name, RecordType::TXT))
            .await
            .unwrap();
        assert_eq!(response.response_code(), ResponseCode::NXDomain);
        assert!(response.answers().is_empty());
    }

    server.shutdown().await;
}

#[tokio::test]
async fn delegated_lookups() {
    let server = TestServer::start().await;
    server
        .solver
        .present(&challenge(
            ChallengeAction::Present,
            "_acme-challenge.test1.example.com.",
            "abc123",
        ))
        .await
        .unwrap();

    let response = exchange(
        server.addr,
        &query("TEST1.example.com.acme.example.org.", RecordType::TXT),
    )
    .await
    .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert!(response.authoritative());
    assert_eq!(txt_strings(&response.answers()[0]), vec!["abc123".to_string()]);

    let response = exchange(
        server.addr,
        &query("test2.example.com.acme.example.org.", RecordType::A),
    )
    .await
    .unwrap();
    assert_eq!(response.response_code(), ResponseCode::FormErr);

    let response = exchange(server.addr, &query("acme.example.org.", RecordType::SOA))
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert_eq!(response.answers().len(), 1);
    match response.answers()[0].data() {
        Some(RData::SOA(soa)) => {
            assert_eq!(soa.mname().to_ascii(), "ns.example.org.");
            assert!(soa.serial() > 1_600_000_000);
        }
        other => panic!("expected SOA rdata, found {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn present_under_zone_resolves() {
    let server = TestServer::start().await;
    let fqdn = "test1.example.com.acme.example.org.";
    server
        .solver
        .present(&challenge(ChallengeAction::Present, fqdn, "abc123"))
        .await
        .unwrap();

    let response = exchange(server.addr, &query(fqdn, RecordType::TXT))
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);
    assert_eq!(txt_strings(&response.answers()[0]), vec!["abc123".to_string()]);

    server
        .solver
        .clean_up(&challenge(ChallengeAction::CleanUp, fqdn, "abc123"))
        .await
        .unwrap();
    let response = exchange(server.addr, &query(fqdn, RecordType::TXT))
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NXDomain);

    server.shutdown().await;
}

#[tokio::test]
async fn out_of_scope_still_answered() {
    let server = TestServer::start().await;
    let response = exchange(server.addr, &query("example.net.", RecordType::A))
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NXDomain);
    assert!(!response.authoritative());
    server.shutdown().await;
}

#[tokio::test]
async fn ignored_datagrams() {
    let server = TestServer::start().await;

    let mut notify = query("acme.example.org.", RecordType::SOA);
    notify.set_op_code(OpCode::Notify);
    assert!(exchange(server.addr, &notify).await.is_none());

    assert!(send_raw(server.addr, b"definitely not DNS").await.is_none());

    // The listener keeps serving after ignoring both.
    let response = exchange(server.addr, &query("acme.example.org.", RecordType::NS))
        .await
        .unwrap();
    assert_eq!(response.response_code(), ResponseCode::NoError);

    server.shutdown().await;
}

#[tokio::test]
async fn no_replies_after_shutdown() {
    let server = TestServer::start().await;
    let addr = server.addr;
    server.shutdown().await;
    assert!(exchange(addr, &query("acme.example.org.", RecordType::NS))
        .await
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_presents_and_lookups() {
    let server = TestServer::start().await;
    let fqdn = |i: usize| format!("test{i}.example.com.");

    let presents: Vec<_> = (0..16)
        .map(|i| {
            let solver = server.solver.clone();
            tokio::spawn(async move {
                solver
                    .present(&challenge(ChallengeAction::Present, &fqdn(i), &format!("key{i}")))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for p in presents {
        p.await.unwrap();
    }

    let addr = server.addr;
    let lookups: Vec<_> = (0..16)
        .map(|i| {
            tokio::spawn(async move {
                let name = format!("_acme-challenge.{}", fqdn(i));
                let response = exchange(addr, &query(&name, RecordType::TXT)).await.unwrap();
                (i, txt_strings(&response.answers()[0]))
            })
        })
        .collect();
    for l in lookups {
        let (i, txt) = l.await.unwrap();
        assert_eq!(txt, vec![format!("key{i}")]);
    }

    server.shutdown().await;
}
