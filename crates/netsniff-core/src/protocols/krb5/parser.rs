use super::der::{self, Tlv};
use super::layout;
use crate::decoder::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrbMessageKind {
    AsReq,
    AsRep,
    TgsReq,
    TgsRep,
    Error,
}

impl KrbMessageKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            layout::TAG_AS_REQ => Some(Self::AsReq),
            layout::TAG_AS_REP => Some(Self::AsRep),
            layout::TAG_TGS_REQ => Some(Self::TgsReq),
            layout::TAG_TGS_REP => Some(Self::TgsRep),
            layout::TAG_KRB_ERROR => Some(Self::Error),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AsReq => "AS-REQ",
            Self::AsRep => "AS-REP",
            Self::TgsReq => "TGS-REQ",
            Self::TgsRep => "TGS-REP",
            Self::Error => "KRB-ERROR",
        }
    }
}

/// Pre-authentication timestamp encrypted with the client key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedTimestamp {
    pub etype: i64,
    pub cipher: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KrbMessage {
    pub kind: KrbMessageKind,
    pub realm: Option<String>,
    pub client: Option<String>,
    pub service: Option<String>,
    pub error_code: Option<i64>,
    pub enc_timestamp: Option<EncryptedTimestamp>,
}

/// Parse a Kerberos message sent over UDP.
///
/// Returns `Ok(None)` when the first byte is not a Kerberos application tag.
pub fn parse_krb5(payload: &[u8]) -> Result<Option<KrbMessage>, DecodeError> {
    let Some(kind) = payload.first().copied().and_then(KrbMessageKind::from_tag) else {
        return Ok(None);
    };
    let (application, _) = der::read_tlv(payload)?;
    let sequence = der::read_expected(application.value, layout::TAG_SEQUENCE)?;
    let fields = der::children(sequence.value)?;

    let mut message = KrbMessage {
        kind,
        realm: None,
        client: None,
        service: None,
        error_code: None,
        enc_timestamp: None,
    };
    match kind {
        KrbMessageKind::AsReq | KrbMessageKind::TgsReq => parse_request(&fields, &mut message)?,
        KrbMessageKind::AsRep | KrbMessageKind::TgsRep => parse_reply(&fields, &mut message)?,
        KrbMessageKind::Error => parse_error(&fields, &mut message)?,
    }
    Ok(Some(message))
}

fn parse_request(fields: &[Tlv<'_>], message: &mut KrbMessage) -> Result<(), DecodeError> {
    let body = der::explicit_sequence(fields, layout::REQ_BODY)?.ok_or(DecodeError::Malformed {
        reason: "KDC request without body",
    })?;
    message.client = principal(&body, layout::REQ_BODY_CNAME)?;
    message.realm = der::explicit(&body, layout::REQ_BODY_REALM)?.map(|tlv| der::string(&tlv));
    message.service = principal(&body, layout::REQ_BODY_SNAME)?;

    if let Some(padata) = der::explicit_sequence(fields, layout::REQ_PADATA)? {
        message.enc_timestamp = find_enc_timestamp(&padata)?;
    }
    Ok(())
}

fn parse_reply(fields: &[Tlv<'_>], message: &mut KrbMessage) -> Result<(), DecodeError> {
    message.realm = der::explicit(fields, layout::REP_CREALM)?.map(|tlv| der::string(&tlv));
    message.client = principal(fields, layout::REP_CNAME)?;
    if let Some(ticket) = der::explicit(fields, layout::REP_TICKET)? {
        if ticket.tag != layout::TAG_TICKET {
            return Err(DecodeError::Malformed {
                reason: "expected ticket",
            });
        }
        let sequence = der::read_expected(ticket.value, layout::TAG_SEQUENCE)?;
        let ticket_fields = der::children(sequence.value)?;
        message.service = principal(&ticket_fields, layout::TICKET_SNAME)?;
    }
    Ok(())
}

fn parse_error(fields: &[Tlv<'_>], message: &mut KrbMessage) -> Result<(), DecodeError> {
    let code = der::explicit(fields, layout::ERROR_CODE)?.ok_or(DecodeError::Malformed {
        reason: "KRB-ERROR without error code",
    })?;
    message.error_code = Some(der::integer(&code)?);
    message.realm = der::explicit(fields, layout::ERROR_REALM)?.map(|tlv| der::string(&tlv));
    message.client = principal(fields, layout::ERROR_CNAME)?;
    message.service = principal(fields, layout::ERROR_SNAME)?;
    Ok(())
}

/// `PrincipalName` in field `[n]`, rendered with `/` between components.
fn principal(fields: &[Tlv<'_>], n: u8) -> Result<Option<String>, DecodeError> {
    let Some(name) = der::explicit_sequence(fields, n)? else {
        return Ok(None);
    };
    let Some(strings) = der::explicit_sequence(&name, layout::PRINCIPAL_NAME_STRING)? else {
        return Ok(None);
    };
    let components: Vec<String> = strings
        .iter()
        .filter(|tlv| tlv.tag == layout::TAG_GENERAL_STRING)
        .map(der::string)
        .collect();
    Ok((!components.is_empty()).then(|| components.join("/")))
}

fn find_enc_timestamp(padata: &[Tlv<'_>]) -> Result<Option<EncryptedTimestamp>, DecodeError> {
    for entry in padata.iter().filter(|tlv| tlv.tag == layout::TAG_SEQUENCE) {
        let fields = der::children(entry.value)?;
        let Some(padata_type) = der::explicit(&fields, layout::PADATA_TYPE)? else {
            continue;
        };
        if der::integer(&padata_type)? != layout::PA_ENC_TIMESTAMP {
            continue;
        }
        let Some(value) = der::explicit(&fields, layout::PADATA_VALUE)? else {
            continue;
        };
        if value.tag != layout::TAG_OCTET_STRING {
            continue;
        }
        let encrypted = der::read_expected(value.value, layout::TAG_SEQUENCE)?;
        let encrypted = der::children(encrypted.value)?;
        let etype = der::explicit(&encrypted, layout::ENCRYPTED_DATA_ETYPE)?;
        let cipher = der::explicit(&encrypted, layout::ENCRYPTED_DATA_CIPHER)?;
        if let (Some(etype), Some(cipher)) = (etype, cipher) {
            return Ok(Some(EncryptedTimestamp {
                etype: der::integer(&etype)?,
                cipher: cipher.value.to_vec(),
            }));
        }
    }
    Ok(None)
}

pub fn error_name(code: i64) -> &'static str {
    match code {
        6 => "KDC_ERR_C_PRINCIPAL_UNKNOWN",
        7 => "KDC_ERR_S_PRINCIPAL_UNKNOWN",
        14 => "KDC_ERR_ETYPE_NOSUPP",
        18 => "KDC_ERR_CLIENT_REVOKED",
        23 => "KDC_ERR_KEY_EXPIRED",
        24 => "KDC_ERR_PREAUTH_FAILED",
        25 => "KDC_ERR_PREAUTH_REQUIRED",
        37 => "KRB_AP_ERR_SKEW",
        68 => "KDC_ERR_WRONG_REALM",
        _ => "KRB_ERR_UNKNOWN",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocols::krb5::der::tests::tlv;

    fn ctx(n: u8, content: &[u8]) -> Vec<u8> {
        tlv(layout::CONTEXT_BASE + n, content)
    }

    fn int(value: u8) -> Vec<u8> {
        tlv(layout::TAG_INTEGER, &[value])
    }

    fn gstr(value: &str) -> Vec<u8> {
        tlv(layout::TAG_GENERAL_STRING, value.as_bytes())
    }

    fn seq(parts: &[Vec<u8>]) -> Vec<u8> {
        tlv(layout::TAG_SEQUENCE, &parts.concat())
    }

    fn principal_name(components: &[&str]) -> Vec<u8> {
        let strings: Vec<Vec<u8>> = components.iter().map(|c| gstr(c)).collect();
        seq(&[ctx(0, &int(1)), ctx(1, &seq(&strings))])
    }

    pub(crate) fn as_req(user: &str, realm: &str, cipher: &[u8]) -> Vec<u8> {
        let encrypted = seq(&[ctx(0, &int(23)), ctx(2, &tlv(layout::TAG_OCTET_STRING, cipher))]);
        let pa_enc = seq(&[
            ctx(1, &int(2)),
            ctx(2, &tlv(layout::TAG_OCTET_STRING, &encrypted)),
        ]);
        let body = seq(&[
            ctx(0, &tlv(0x03, &[0, 0x40, 0x81, 0, 0x10])),
            ctx(1, &principal_name(&[user])),
            ctx(2, &gstr(realm)),
            ctx(3, &principal_name(&["krbtgt", realm])),
        ]);
        let request = seq(&[
            ctx(1, &int(5)),
            ctx(2, &int(10)),
            ctx(3, &seq(&[pa_enc])),
            ctx(4, &body),
        ]);
        tlv(layout::TAG_AS_REQ, &request)
    }

    pub(crate) fn krb_error(code: u8, realm: &str) -> Vec<u8> {
        let error = seq(&[
            ctx(0, &int(5)),
            ctx(1, &int(30)),
            ctx(6, &int(code)),
            ctx(9, &gstr(realm)),
            ctx(10, &principal_name(&["krbtgt", realm])),
        ]);
        tlv(layout::TAG_KRB_ERROR, &error)
    }

    #[test]
    fn as_req_carries_principals_and_timestamp() {
        let message = parse_krb5(&as_req("alice", "CORP.LOCAL", &[0xaa; 52]))
            .unwrap()
            .unwrap();
        assert_eq!(message.kind, KrbMessageKind::AsReq);
        assert_eq!(message.client.as_deref(), Some("alice"));
        assert_eq!(message.realm.as_deref(), Some("CORP.LOCAL"));
        assert_eq!(message.service.as_deref(), Some("krbtgt/CORP.LOCAL"));
        let timestamp = message.enc_timestamp.unwrap();
        assert_eq!(timestamp.etype, 23);
        assert_eq!(timestamp.cipher.len(), 52);
    }

    #[test]
    fn krb_error_reports_code() {
        let message = parse_krb5(&krb_error(25, "CORP.LOCAL")).unwrap().unwrap();
        assert_eq!(message.kind, KrbMessageKind::Error);
        assert_eq!(message.error_code, Some(25));
        assert_eq!(error_name(25), "KDC_ERR_PREAUTH_REQUIRED");
        assert!(message.client.is_none());
    }

    #[test]
    fn non_kerberos_tag_is_ignored() {
        assert!(parse_krb5(&[0x30, 0x00]).unwrap().is_none());
        assert!(parse_krb5(&[]).unwrap().is_none());
    }

    #[test]
    fn truncated_message_is_an_error() {
        let message = as_req("alice", "CORP.LOCAL", &[0xaa; 52]);
        assert!(parse_krb5(&message[..message.len() - 10]).is_err());
    }
}
