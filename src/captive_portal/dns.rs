//! Wildcard DNS responder for captive portal detection.
//!
//! Every A query is answered with the access point's own address, so any
//! hostname a client looks up ends at our HTTP server.

use std::{
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
};

use crate::config::DNS_TTL_SECS;

const HEADER_LEN: usize = 12;
const MAX_PACKET: usize = 512;

const TYPE_A: u16 = 1;
const TYPE_ANY: u16 = 255;
const CLASS_IN: u16 = 1;

pub struct DnsResponder {
    socket: UdpSocket,
    answer_ip: Ipv4Addr,
    frame: [u8; MAX_PACKET],
}

impl DnsResponder {
    /// Binds a non-blocking UDP socket; `poll` must be called from the main loop.
    pub fn bind(addr: SocketAddr, answer_ip: Ipv4Addr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!(
            "DNS server listening on {} - responding with {}",
            socket.local_addr()?,
            answer_ip
        );
        Ok(Self {
            socket,
            answer_ip,
            frame: [0; MAX_PACKET],
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Answers at most one pending query. Returns true if a response was sent.
    pub fn poll(&mut self) -> bool {
        let (len, remote) = match self.socket.recv_from(&mut self.frame) {
            Ok(r) => r,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return false,
            Err(e) => {
                log::warn!("DNS receive error: {:?}", e);
                return false;
            }
        };

        let Some(response) = build_response(&self.frame[..len], self.answer_ip) else {
            log::debug!("Ignoring malformed DNS packet from {}", remote);
            return false;
        };

        match self.socket.send_to(&response, remote) {
            Ok(_) => {
                log::debug!("DNS query from {} answered with {}", remote, self.answer_ip);
                true
            }
            Err(e) => {
                log::warn!("DNS send error: {:?}", e);
                false
            }
        }
    }
}

/// Builds the reply to `query`, or `None` if it is not a standard query we can answer.
///
/// The reply carries the first question only. A and ANY questions get a
/// single A record with `answer_ip`; other types get an empty NOERROR reply.
pub fn build_response(query: &[u8], answer_ip: Ipv4Addr) -> Option<Vec<u8>> {
    let header = query.get(..HEADER_LEN)?;
    let flags = u16::from_be_bytes([header[2], header[3]]);
    let qdcount = u16::from_be_bytes([header[4], header[5]]);

    let is_response = flags & 0x8000 != 0;
    let opcode = (flags >> 11) & 0x0f;
    if is_response || opcode != 0 || qdcount == 0 {
        return None;
    }

    let question_end = skip_name(query, HEADER_LEN)?.checked_add(4)?;
    let question = query.get(HEADER_LEN..question_end)?;
    let qtype = u16::from_be_bytes([question[question.len() - 4], question[question.len() - 3]]);
    let qclass = u16::from_be_bytes([question[question.len() - 2], question[question.len() - 1]]);
    let answer = (qtype == TYPE_A || qtype == TYPE_ANY) && qclass == CLASS_IN;

    let mut response = Vec::with_capacity(question_end + 16);
    response.extend_from_slice(&header[..2]);
    // QR=1, AA=1, keep opcode and RD; RA=1, RCODE=0
    let reply_flags = 0x8400 | (flags & 0x7900) | 0x0080;
    response.extend_from_slice(&reply_flags.to_be_bytes());
    response.extend_from_slice(&1u16.to_be_bytes());
    response.extend_from_slice(&u16::from(answer).to_be_bytes());
    response.extend_from_slice(&0u16.to_be_bytes());
    response.extend_from_slice(&0u16.to_be_bytes());
    response.extend_from_slice(question);

    if answer {
        // NAME: pointer to the question name at offset 12
        response.extend_from_slice(&[0xC0, 0x0C]);
        response.extend_from_slice(&TYPE_A.to_be_bytes());
        response.extend_from_slice(&CLASS_IN.to_be_bytes());
        response.extend_from_slice(&DNS_TTL_SECS.to_be_bytes());
        response.extend_from_slice(&4u16.to_be_bytes());
        response.extend_from_slice(&answer_ip.octets());
    }

    Some(response)
}

/// Returns the offset just past the uncompressed name starting at `pos`.
fn skip_name(packet: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let len = *packet.get(pos)? as usize;
        match len {
            0 => return Some(pos + 1),
            // compression pointers are not valid in a query's question
            l if l & 0xC0 != 0 => return None,
            l => pos += 1 + l,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{Ipv4Addr, UdpSocket},
        time::Duration,
    };

    use super::{build_response, DnsResponder};

    const AP_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

    fn query(id: u16, name: &str, qtype: u16) -> Vec<u8> {
        let mut q = Vec::new();
        q.extend_from_slice(&id.to_be_bytes());
        q.extend_from_slice(&[0x01, 0x00]); // RD
        q.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0]);
        for label in name.split('.') {
            q.push(label.len() as u8);
            q.extend_from_slice(label.as_bytes());
        }
        q.push(0);
        q.extend_from_slice(&qtype.to_be_bytes());
        q.extend_from_slice(&[0, 1]);
        q
    }

    #[test]
    fn test_a_query_answered_with_ap_ip() {
        let q = query(0xBEEF, "connectivitycheck.gstatic.com", 1);
        let r = build_response(&q, AP_IP).unwrap();

        assert_eq!(&r[..2], &[0xBE, 0xEF]);
        assert_eq!(&r[2..4], &[0x85, 0x80]);
        assert_eq!(&r[4..12], &[0, 1, 0, 1, 0, 0, 0, 0]);
        assert_eq!(&r[12..q.len()], &q[12..]);

        let answer = &r[q.len()..];
        assert_eq!(
            answer,
            &[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 192, 168, 4, 1]
        );
    }

    #[test]
    fn test_additional_records_are_dropped() {
        let mut q = query(7, "captive.apple.com", 1);
        let question_end = q.len();
        q[11] = 1; // ARCOUNT
        q.extend_from_slice(&[0, 0, 41, 0x10, 0, 0, 0, 0, 0, 0, 0]); // EDNS OPT

        let r = build_response(&q, AP_IP).unwrap();
        assert_eq!(&r[10..12], &[0, 0]);
        assert_eq!(&r[12..question_end], &q[12..question_end]);
        assert_eq!(r.len(), question_end + 16);
    }

    #[test]
    fn test_aaaa_query_gets_empty_answer() {
        let q = query(1, "example.com", 28);
        let r = build_response(&q, AP_IP).unwrap();

        assert_eq!(&r[6..8], &[0, 0]);
        assert_eq!(r.len(), q.len());
    }

    #[test]
    fn test_rejects_malformed_packets() {
        assert!(build_response(&[0; 11], AP_IP).is_none());

        let mut response = query(1, "example.com", 1);
        response[2] |= 0x80;
        assert!(build_response(&response, AP_IP).is_none());

        let mut no_question = query(1, "example.com", 1);
        no_question[5] = 0;
        assert!(build_response(&no_question, AP_IP).is_none());

        let truncated = query(1, "example.com", 1);
        assert!(build_response(&truncated[..truncated.len() - 2], AP_IP).is_none());

        let mut pointer = query(1, "example.com", 1);
        pointer[12] = 0xC0;
        assert!(build_response(&pointer, AP_IP).is_none());
    }

    #[test]
    fn test_responder_answers_over_udp() {
        let mut responder = DnsResponder::bind("127.0.0.1:0".parse().unwrap(), AP_IP).unwrap();
        let server = responder.local_addr().unwrap();

        assert!(!responder.poll());

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let q = query(0x1234, "msftconnecttest.com", 1);
        client.send_to(&q, server).unwrap();

        let mut answered = false;
        for _ in 0..200 {
            if responder.poll() {
                answered = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(answered);

        let mut buf = [0u8; 512];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x12, 0x34]);
        assert_eq!(&buf[len - 4..len], &[192, 168, 4, 1]);
    }
}
