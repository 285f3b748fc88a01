//! The production [`ZoneClient`]: Route53 `ChangeResourceRecordSets` over
//! plain HTTPS with AWS SigV4 request signing.
//!
//! One client is constructed per credentials set and reused for every domain
//! that references it. The client issues exactly one request per upsert; any
//! non-success response becomes [`Error::Upstream`] carrying the provider's
//! message.

use crate::config::Credentials;
use crate::error::Error;
use crate::zone::ZoneClient;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const ROUTE53_HOST: &str = "route53.amazonaws.com";
const API_VERSION: &str = "2013-04-01";
const SERVICE: &str = "route53";
// Route53 is a global service; its SigV4 scope is always us-east-1.
const REGION: &str = "us-east-1";
const SIGNED_HEADERS: &str = "host;x-amz-date";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

const AMZ_DATE: &[FormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");
const DATESTAMP: &[FormatItem<'static>] = format_description!("[year][month][day]");

type HmacSha256 = Hmac<Sha256>;

pub struct Route53Client {
    access_id: String,
    access_key: String,
    http: reqwest::Client,
}

// The access key never appears in Debug output.
impl fmt::Debug for Route53Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route53Client")
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

impl Route53Client {
    #[must_use]
    pub fn new(creds: &Credentials) -> Self {
        Self {
            access_id: creds.access_id.clone(),
            access_key: creds.access_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Build the `X-Amz-Date` and `Authorization` header values for a POST of
    /// `payload` to `path`, per the SigV4 signing process.
    fn sign_request(
        &self,
        now: OffsetDateTime,
        path: &str,
        payload: &str,
    ) -> Result<(String, String), Error> {
        let amz_date = now.format(AMZ_DATE)?;
        let datestamp = now.format(DATESTAMP)?;

        let payload_hash = hex::encode(Sha256::digest(payload.as_bytes()));
        let canonical_headers = format!("host:{ROUTE53_HOST}\nx-amz-date:{amz_date}\n");
        let canonical_request = format!(
            "POST\n{path}\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{payload_hash}"
        );

        let scope = format!("{datestamp}/{REGION}/{SERVICE}/aws4_request");
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let k_date = hmac_sha256(
            format!("AWS4{}", self.access_key).as_bytes(),
            datestamp.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, REGION.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.access_id
        );
        Ok((amz_date, authorization))
    }
}

#[async_trait::async_trait]
impl ZoneClient for Route53Client {
    async fn upsert(
        &self,
        zone_id: &str,
        record: &str,
        ip: &str,
        ttl: u32,
        comment: &str,
    ) -> Result<(), Error> {
        let path = format!("/{API_VERSION}/hostedzone/{zone_id}/rrset");
        let body = change_batch(record, ip, ttl, comment);
        let (amz_date, authorization) =
            self.sign_request(OffsetDateTime::now_utc(), &path, &body)?;

        let response = self
            .http
            .post(format!("https://{ROUTE53_HOST}{path}"))
            .timeout(UPSTREAM_TIMEOUT)
            .header("X-Amz-Date", amz_date)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Upstream(error_message(status, &body)))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// The `ChangeResourceRecordSets` request body: one UPSERT of an A record.
fn change_batch(record: &str, ip: &str, ttl: u32, comment: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<ChangeResourceRecordSetsRequest xmlns="https://route53.amazonaws.com/doc/2013-04-01/">"#,
            "<ChangeBatch><Comment>{comment}</Comment><Changes><Change>",
            "<Action>UPSERT</Action><ResourceRecordSet>",
            "<Name>{record}</Name><Type>A</Type><TTL>{ttl}</TTL>",
            "<ResourceRecords><ResourceRecord><Value>{ip}</Value></ResourceRecord></ResourceRecords>",
            "</ResourceRecordSet></Change></Changes></ChangeBatch>",
            "</ChangeResourceRecordSetsRequest>"
        ),
        comment = xml_escape(comment),
        record = xml_escape(record),
        ttl = ttl,
        ip = xml_escape(ip),
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Pull the `<Message>` out of a Route53 error response, falling back to the
/// raw body (or just the status) when there isn't one.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Some(start) = body.find("<Message>") {
        let rest = &body[start + "<Message>".len()..];
        if let Some(end) = rest.find("</Message>") {
            return rest[..end].to_string();
        }
    }
    if body.is_empty() {
        format!("route53 returned {status}")
    } else {
        format!("route53 returned {status}: {body}")
    }
}
