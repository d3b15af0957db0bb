//! Mapping between `waypoint_dns_domain::RecordType` and `hickory_proto::rr::RecordType`.

use hickory_proto::rr::RecordType as HickoryRecordType;
use waypoint_dns_domain::RecordType;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(record_type: RecordType) -> HickoryRecordType {
        match record_type {
            RecordType::A => HickoryRecordType::A,
            RecordType::AAAA => HickoryRecordType::AAAA,
            RecordType::ANY => HickoryRecordType::ANY,
            RecordType::CNAME => HickoryRecordType::CNAME,
            RecordType::NS => HickoryRecordType::NS,
            RecordType::PTR => HickoryRecordType::PTR,
            RecordType::SOA => HickoryRecordType::SOA,
            RecordType::SRV => HickoryRecordType::SRV,
            RecordType::TXT => HickoryRecordType::TXT,
            RecordType::Other(code) => HickoryRecordType::from(code),
        }
    }

    /// Types the discovery pipeline does not special-case are carried as `Other`.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        match hickory_type {
            HickoryRecordType::A => RecordType::A,
            HickoryRecordType::AAAA => RecordType::AAAA,
            HickoryRecordType::ANY => RecordType::ANY,
            HickoryRecordType::CNAME => RecordType::CNAME,
            HickoryRecordType::NS => RecordType::NS,
            HickoryRecordType::PTR => RecordType::PTR,
            HickoryRecordType::SOA => RecordType::SOA,
            HickoryRecordType::SRV => RecordType::SRV,
            HickoryRecordType::TXT => RecordType::TXT,
            other => RecordType::Other(u16::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_map_both_ways() {
        for rt in [
            RecordType::A,
            RecordType::AAAA,
            RecordType::ANY,
            RecordType::CNAME,
            RecordType::NS,
            RecordType::PTR,
            RecordType::SOA,
            RecordType::SRV,
            RecordType::TXT,
        ] {
            assert_eq!(RecordTypeMapper::from_hickory(RecordTypeMapper::to_hickory(rt)), rt);
        }
    }

    #[test]
    fn unknown_types_keep_their_code() {
        assert_eq!(
            RecordTypeMapper::from_hickory(HickoryRecordType::MX),
            RecordType::Other(15)
        );
        assert_eq!(RecordTypeMapper::to_hickory(RecordType::Other(15)), HickoryRecordType::MX);
    }
}
