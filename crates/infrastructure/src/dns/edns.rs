use hickory_proto::op::{Edns, Message, ResponseCode};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsCode, EdnsOption};
use std::net::IpAddr;

pub fn has_edns(message: &Message) -> bool {
    message.extensions().is_some()
}

/// UDP payload size the client advertised, if it sent an OPT record.
pub fn udp_payload(message: &Message) -> Option<u16> {
    message.extensions().as_ref().map(|edns| edns.max_payload())
}

pub fn client_subnet(message: &Message) -> Option<ClientSubnet> {
    let edns = message.extensions().as_ref()?;
    match edns.options().get(EdnsCode::Subnet) {
        Some(EdnsOption::Subnet(subnet)) => Some(subnet.clone()),
        _ => None,
    }
}

pub fn client_subnet_address(message: &Message) -> Option<IpAddr> {
    client_subnet(message).map(|subnet| subnet.addr())
}

/// Echoes the request's EDNS payload size, and its client-subnet option, on
/// the response. Does nothing for requests without EDNS.
///
/// The subnet scope is 0 when the answer is valid for any client (or is an
/// error); otherwise it is the request's source prefix.
pub fn set_edns(request: &Message, response: &mut Message, ecs_global: bool) {
    let Some(request_edns) = request.extensions().as_ref() else {
        return;
    };

    let mut edns = Edns::new();
    edns.set_max_payload(request_edns.max_payload());

    if let Some(subnet) = client_subnet(request) {
        let scope = match response.response_code() {
            _ if ecs_global => 0,
            ResponseCode::NXDomain
            | ResponseCode::ServFail
            | ResponseCode::Refused
            | ResponseCode::NotImp => 0,
            _ => subnet.source_prefix(),
        };
        edns.options_mut().insert(EdnsOption::Subnet(ClientSubnet::new(
            subnet.addr(),
            subnet.source_prefix(),
            scope,
        )));
    }

    response.set_edns(edns);
}
