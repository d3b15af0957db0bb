use hickory_proto::op::Message;
use socket2::{Domain, Protocol as SocketProtocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use waypoint_dns_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};
use waypoint_dns_infrastructure::dns::{wire, ClientInfo, Protocol, Router};

const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_UDP_REQUEST_SIZE: usize = 65535;

pub async fn start_dns_server(socket_addr: SocketAddr, router: Arc<Router>) -> anyhow::Result<()> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    info!(bind_address = %socket_addr, "Starting DNS server");

    let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
    let tcp_listener = create_tcp_listener(domain, socket_addr)?;

    let mut join_set: JoinSet<()> = JoinSet::new();

    let router_udp = router.clone();
    join_set.spawn(async move {
        run_udp_listener(udp_socket, router_udp).await;
    });

    join_set.spawn(async move {
        run_tcp_listener(tcp_listener, router).await;
    });

    info!("DNS server ready on {} (udp, tcp)", socket_addr);

    while join_set.join_next().await.is_some() {}
    Ok(())
}

async fn run_udp_listener(socket: Arc<UdpSocket>, router: Arc<Router>) {
    let mut recv_buf = vec![0u8; MAX_UDP_REQUEST_SIZE];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) => {
                error!(error = %e, "UDP recv error");
                continue;
            }
        };

        let request = match wire::decode(&recv_buf[..n]) {
            Ok(request) => request,
            Err(e) => {
                debug!(client = %from, error = %e, "dropping malformed UDP request");
                continue;
            }
        };

        let router = router.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            let client = ClientInfo::new(from, Protocol::Udp);
            if let Some(bytes) = answer(&router, &request, client).await {
                if let Err(e) = socket.send_to(&bytes, from).await {
                    warn!(client = %from, error = %e, "failed to send UDP response");
                }
            }
        });
    }
}

async fn run_tcp_listener(listener: TcpListener, router: Arc<Router>) {
    loop {
        let (stream, from) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "TCP accept error");
                continue;
            }
        };

        let router = router.clone();
        tokio::spawn(async move {
            serve_tcp_connection(stream, from, router).await;
        });
    }
}

/// Answers framed requests until the peer closes the connection or idles out.
async fn serve_tcp_connection(mut stream: TcpStream, from: SocketAddr, router: Arc<Router>) {
    loop {
        let read = tokio::time::timeout(TCP_IDLE_TIMEOUT, read_with_length_prefix(&mut stream));
        let bytes = match read.await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                debug!(client = %from, error = %e, "closing TCP connection");
                return;
            }
            Err(_) => {
                debug!(client = %from, "TCP connection idle, closing");
                return;
            }
        };

        let request = match wire::decode(&bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!(client = %from, error = %e, "dropping malformed TCP request");
                return;
            }
        };

        let client = ClientInfo::new(from, Protocol::Tcp);
        let Some(response) = answer(&router, &request, client).await else {
            return;
        };
        if let Err(e) = send_with_length_prefix(&mut stream, &response).await {
            warn!(client = %from, error = %e, "failed to send TCP response");
            return;
        }
    }
}

async fn answer(router: &Router, request: &Message, client: ClientInfo) -> Option<Vec<u8>> {
    let ctx = router.default_request_context();
    let response = router.handle_request(request, &ctx, client).await;

    match wire::encode(&response, router.config().compress()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            error!(id = request.id(), error = %e, "failed to encode response");
            None
        }
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(SocketProtocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(SocketProtocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
