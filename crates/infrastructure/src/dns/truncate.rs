//! Response-size governor.
//!
//! Keeps UDP answers within the negotiated payload size and TCP answers
//! within the 64 KiB message limit. Answers are dropped from the tail; the
//! extra section is rebuilt so it only carries records the remaining SRV
//! answers point at. The last answer is never dropped, even when it alone
//! exceeds the limit.

use super::wire;
use hickory_proto::op::Message;
use hickory_proto::rr::{RData, Record, RecordType};
use rustc_hash::{FxHashMap, FxHashSet};

pub const DEFAULT_MAX_UDP_SIZE: usize = 512;
/// 65535 minus IP and UDP headers.
pub const MAX_UDP_DATAGRAM_SIZE: usize = 65535 - 68;
/// Hard ceiling on UDP answers, lowered further by `udp_answer_limit`.
pub const MAX_UDP_ANSWER_LIMIT: usize = 8;
pub const MAX_TCP_SIZE: usize = 65523;
const MAX_TCP_ANSWERS: usize = 4096;
const MAX_TCP_SRV_ANSWERS: usize = 1024;
const UDP_HEADER_SIZE: usize = 8;
/// Overshoot above which the cut point is found by binary search.
const BINARY_SEARCH_THRESHOLD: usize = 100;

pub type RecordIndex = FxHashMap<String, Record>;

/// Indexes records by lower-cased owner name, keeping the first per name.
pub fn index_records(records: &[Record]) -> RecordIndex {
    let mut index = RecordIndex::default();
    for record in records {
        index
            .entry(wire::canonical_text(record.name()))
            .or_insert_with(|| record.clone());
    }
    index
}

/// The minimal extra section covering the SRV targets in `answers`,
/// following CNAMEs through the index.
pub fn sync_extra(index: &RecordIndex, answers: &[Record]) -> Vec<Record> {
    let mut extra = Vec::with_capacity(answers.len());
    let mut resolved = FxHashSet::default();

    for answer in answers {
        let RData::SRV(srv) = answer.data() else {
            continue;
        };
        let mut target = wire::canonical_text(srv.target());
        while resolved.insert(target.clone()) {
            let Some(record) = index.get(&target) else {
                break;
            };
            extra.push(record.clone());
            match record.data() {
                RData::CNAME(cname) => target = wire::canonical_text(&cname.0),
                _ => break,
            }
        }
    }
    extra
}

/// Sections of a response being trimmed. The template holds everything else.
struct Draft {
    template: Message,
    answers: Vec<Record>,
    name_servers: Vec<Record>,
    additionals: Vec<Record>,
    index: Option<RecordIndex>,
    compress: bool,
}

impl Draft {
    fn new(mut response: Message, compress: bool) -> Self {
        let answers = response.take_answers();
        let name_servers = response.take_name_servers();
        let additionals = response.take_additionals();
        let index = if additionals.is_empty() {
            None
        } else {
            Some(index_records(&additionals))
        };
        Self {
            template: response,
            answers,
            name_servers,
            additionals,
            index,
            compress,
        }
    }

    fn len_with(&self, answers: &[Record], additionals: &[Record]) -> usize {
        let mut message = self.template.clone();
        wire::set_sections(
            &mut message,
            answers.to_vec(),
            self.name_servers.clone(),
            additionals.to_vec(),
        );
        wire::encoded_len(&message, self.compress)
    }

    fn len(&self) -> usize {
        self.len_with(&self.answers, &self.additionals)
    }

    fn cut_answers(&mut self, keep: usize) {
        self.answers.truncate(keep);
        if let Some(index) = &self.index {
            self.additionals = sync_extra(index, &self.answers);
        }
    }

    /// Largest answer count whose encoding fits `max_size`, never below one.
    fn binary_truncate(&self, max_size: usize) -> usize {
        let mut start = 0;
        let mut end = self.answers.len() + 1;
        while end - start > 1 {
            let median = start + (end - start) / 2;
            let answers = &self.answers[..median];
            let extra = match &self.index {
                Some(index) => sync_extra(index, answers),
                None => self.additionals.clone(),
            };
            let len = self.len_with(answers, &extra);
            if len <= max_size {
                if max_size - len < 10 {
                    return median;
                }
                start = median;
            } else {
                end = median;
            }
        }
        start.max(1)
    }

    fn shrink_to(&mut self, limit: usize, max_size: usize) {
        loop {
            if self.answers.len() <= 1 {
                break;
            }
            let len = self.len();
            if len <= limit {
                break;
            }
            self.name_servers.clear();
            let keep = if len > max_size + BINARY_SEARCH_THRESHOLD {
                self.binary_truncate(max_size)
            } else {
                self.answers.len() - 1
            };
            self.cut_answers(keep);
        }
    }

    fn finish(self) -> Message {
        let mut message = self.template;
        wire::set_sections(&mut message, self.answers, self.name_servers, self.additionals);
        message
    }
}

/// Trims a UDP response. Returns the response and whether answers were dropped.
///
/// Without EDNS the answer count is capped first, and sizes are measured
/// uncompressed so the reply stays within 512 bytes even if a downstream
/// hop decompresses it.
pub fn trim_udp(
    request: &Message,
    response: Message,
    udp_answer_limit: usize,
    compress: bool,
) -> (Message, bool) {
    let max_size = request
        .extensions()
        .as_ref()
        .map(|edns| usize::from(edns.max_payload()))
        .filter(|size| *size > DEFAULT_MAX_UDP_SIZE)
        .unwrap_or(DEFAULT_MAX_UDP_SIZE)
        .min(MAX_UDP_DATAGRAM_SIZE);

    let mut draft = Draft::new(response, compress);
    let original_answers = draft.answers.len();

    let max_answers = MAX_UDP_ANSWER_LIMIT.min(udp_answer_limit).max(1);
    if max_size == DEFAULT_MAX_UDP_SIZE && original_answers > max_answers {
        draft.compress = false;
        draft.cut_answers(max_answers);
    }

    draft.shrink_to(max_size - UDP_HEADER_SIZE, max_size);

    let trimmed = draft.answers.len() < original_answers;
    (draft.finish(), trimmed)
}

/// Trims a TCP response to the 64 KiB message limit.
pub fn trim_tcp(request: &Message, response: Message, compress: bool) -> (Message, bool) {
    let is_srv = request
        .queries()
        .first()
        .map(|q| q.query_type() == RecordType::SRV)
        .unwrap_or(false);
    let max_answers = if is_srv {
        MAX_TCP_SRV_ANSWERS
    } else {
        MAX_TCP_ANSWERS
    };

    let mut draft = Draft::new(response, compress);
    let original_answers = draft.answers.len();
    if original_answers > max_answers {
        draft.answers.truncate(max_answers);
    }

    draft.shrink_to(MAX_TCP_SIZE, MAX_TCP_SIZE);

    let trimmed = draft.answers.len() < original_answers;
    (draft.finish(), trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::{A, CNAME, SRV};
    use hickory_proto::rr::Name;
    use std::net::Ipv4Addr;

    fn name(s: &str) -> Name {
        wire::name(s)
    }

    fn srv(target: &str) -> Record {
        Record::from_rdata(
            name("web.service.consul."),
            0,
            RData::SRV(SRV::new(1, 1, 80, name(target))),
        )
    }

    fn a(owner: &str, last: u8) -> Record {
        Record::from_rdata(name(owner), 0, RData::A(A(Ipv4Addr::new(10, 0, 0, last))))
    }

    #[test]
    fn index_keeps_first_record_per_name() {
        let index = index_records(&[a("Node1.consul.", 1), a("node1.consul.", 2)]);
        assert_eq!(index.len(), 1);
        match index["node1.consul."].data() {
            RData::A(addr) => assert_eq!(addr.0, Ipv4Addr::new(10, 0, 0, 1)),
            other => panic!("unexpected rdata {:?}", other),
        }
    }

    #[test]
    fn sync_extra_follows_cnames_once() {
        let cname = Record::from_rdata(
            name("alias.consul."),
            0,
            RData::CNAME(CNAME(name("node1.consul."))),
        );
        let index = index_records(&[cname, a("node1.consul.", 1), a("node2.consul.", 2)]);
        let answers = vec![srv("alias.consul."), srv("node1.consul.")];
        let extra = sync_extra(&index, &answers);
        assert_eq!(extra.len(), 2);
        assert_eq!(extra[0].record_type(), RecordType::CNAME);
        assert_eq!(extra[1].record_type(), RecordType::A);
    }

    #[test]
    fn sync_extra_ignores_non_srv_answers() {
        let index = index_records(&[a("node1.consul.", 1)]);
        assert!(sync_extra(&index, &[a("node1.consul.", 1)]).is_empty());
    }
}
