use crate::config::Shared;
use crate::dns::classify::{classify, Classification};
use crate::error::Error;
use crate::txt_store::DynTxtStore;
use time::OffsetDateTime;
use tracing::{debug, error};
use trust_dns_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use trust_dns_proto::rr::rdata::{SOA, TXT};
use trust_dns_proto::rr::{Name, RData, Record, RecordType};

/// TTL of every synthesized record. Challenge values change between validation attempts so
/// resolvers shouldn't hold on to them.
const RECORD_TTL: u32 = 5;

/// A single TXT character-string holds at most 255 bytes; longer values are split.
const MAX_TXT_LEN: usize = 255;

#[derive(Clone)]
pub(crate) struct Handler {
    config: Shared,
    txt_store: DynTxtStore,
}

/// The outcome of answering one question.
#[derive(Debug)]
struct Answer {
    response_code: ResponseCode,
    authoritative: bool,
    answers: Vec<Record>,
    authority: Vec<Record>,
}

impl Answer {
    fn records(answers: Vec<Record>) -> Self {
        Answer {
            response_code: ResponseCode::NoError,
            authoritative: true,
            answers,
            authority: Vec::default(),
        }
    }

    fn no_data(soa: Record) -> Self {
        Answer {
            response_code: ResponseCode::NoError,
            authoritative: true,
            answers: Vec::default(),
            authority: vec![soa],
        }
    }

    fn rcode(response_code: ResponseCode, authoritative: bool) -> Self {
        Answer {
            response_code,
            authoritative,
            answers: Vec::default(),
            authority: Vec::default(),
        }
    }
}

impl Handler {
    pub(crate) fn new(config: Shared, txt_store: DynTxtStore) -> Self {
        Handler { config, txt_store }
    }

    /// Build the response for `request`, or `None` if it shouldn't be answered at all.
    ///
    /// Every question is answered in order and the results accumulate in one response. The
    /// response code is that of the first question that didn't get `NOERROR`, and the message
    /// is only marked authoritative if every question was answered authoritatively. A record
    /// that can't be synthesized turns the whole response into `SERVFAIL` and the remaining
    /// questions are skipped.
    pub(crate) async fn handle_message(&self, request: &Message) -> Option<Message> {
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            debug!(
                "ignoring {:?} message with opcode {:?}",
                request.message_type(),
                request.op_code()
            );
            return None;
        }

        let mut response = Message::new();
        response.set_id(request.id());
        response.set_message_type(MessageType::Response);
        response.set_op_code(OpCode::Query);
        response.set_recursion_desired(request.recursion_desired());
        response.set_recursion_available(false);
        response.add_queries(request.queries().to_vec());

        if request.queries().is_empty() {
            response.set_response_code(ResponseCode::FormErr);
            return Some(response);
        }

        let mut response_code = ResponseCode::NoError;
        let mut authoritative = true;
        for query in request.queries() {
            debug!("received DNS query: {} {}", query.name(), query.query_type());
            match self.answer_query(query).await {
                Ok(answer) => {
                    if response_code == ResponseCode::NoError {
                        response_code = answer.response_code;
                    }
                    authoritative &= answer.authoritative;
                    response.add_answers(answer.answers);
                    response.add_name_servers(answer.authority);
                }
                Err(err) => {
                    error!(
                        "failed to answer {} {}: {err}",
                        query.name(),
                        query.query_type()
                    );
                    response_code = ResponseCode::ServFail;
                    authoritative = false;
                    break;
                }
            }
        }
        response.set_response_code(response_code);
        response.set_authoritative(authoritative);
        Some(response)
    }

    async fn answer_query(&self, query: &Query) -> Result<Answer, Error> {
        let qname = query.name().to_lowercase().to_ascii();
        match classify(&qname, &self.config) {
            Classification::OutOfScope => Ok(Answer::rcode(ResponseCode::NXDomain, false)),
            Classification::ZoneApex => match query.query_type() {
                RecordType::NS => Ok(Answer::records(vec![self.ns_record(query.name())])),
                RecordType::SOA => Ok(Answer::records(vec![self.soa_record(query.name())?])),
                _ => Ok(Answer::no_data(self.soa_record(query.name())?)),
            },
            Classification::DelegatedUnderZone { .. } if query.query_type() == RecordType::SOA => {
                Ok(Answer::records(vec![self.soa_record(query.name())?]))
            }
            Classification::DelegatedUnderZone { key } => {
                self.answer_challenge(query, &key, true).await
            }
            Classification::AcmeChallenge { key } => {
                self.answer_challenge(query, &key, false).await
            }
        }
    }

    async fn answer_challenge(
        &self,
        query: &Query,
        key: &str,
        delegated: bool,
    ) -> Result<Answer, Error> {
        let value = self.txt_store.lookup(key).await;
        match (query.query_type(), value) {
            (RecordType::TXT, Some(value)) => {
                Ok(Answer::records(vec![txt_record(query.name(), &value)]))
            }
            (RecordType::NS, Some(_)) => Ok(Answer::records(vec![self.ns_record(query.name())])),
            (RecordType::SOA, Some(_)) => {
                Ok(Answer::records(vec![self.soa_record(query.name())?]))
            }
            // The name isn't ours to answer address queries for; tell the resolver not to
            // retry here rather than claim it doesn't exist.
            (RecordType::A | RecordType::AAAA, None) if delegated => {
                Ok(Answer::rcode(ResponseCode::FormErr, true))
            }
            (_, None) => Ok(Answer::rcode(ResponseCode::NXDomain, true)),
            (_, Some(_)) => Ok(Answer::no_data(self.soa_record(query.name())?)),
        }
    }

    fn ns_record(&self, name: &Name) -> Record {
        Record::from_rdata(
            name.clone(),
            RECORD_TTL,
            RData::NS(self.config.external_server_address.clone()),
        )
    }

    fn soa_record(&self, name: &Name) -> Result<Record, Error> {
        let ns_admin = self.config.ns_admin()?;
        // NB: Unix timestamps fit a u32 serial until 2106.
        let serial = u32::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(u32::MAX);
        let soa_rdata = RData::SOA(SOA::new(
            self.config.external_server_address.clone(),
            ns_admin,
            serial,
            5,         // refresh
            5,         // retry
            1_209_600, // expire, 2 weeks.
            5,         // negative caching TTL
        ));
        Ok(Record::from_rdata(name.clone(), RECORD_TTL, soa_rdata))
    }
}

fn txt_record(name: &Name, value: &str) -> Record {
    let mut strings = Vec::with_capacity(value.len() / MAX_TXT_LEN + 1);
    let mut rest = value;
    while rest.len() > MAX_TXT_LEN {
        let mut end = MAX_TXT_LEN;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        strings.push(head.to_string());
        rest = tail;
    }
    strings.push(rest.to_string());
    Record::from_rdata(name.clone(), RECORD_TTL, RData::TXT(TXT::new(strings)))
}
