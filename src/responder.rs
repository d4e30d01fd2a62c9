use crate::classifier::{Classifier, Verdict};
use crate::config::ReplyConfig;
use crate::error::{Error, Result};
use crate::message::ParsedEmail;
use crate::services::{InferenceClient, Mailer, ObjectStore, OutgoingMessage};
use log::{info, warn};
use serde::Deserialize;

/// Object-created notification from the mail bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageRecord {
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

impl StorageEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Event(e.to_string()))
    }

    /// Bucket and key of the object this invocation handles.
    pub fn object_location(&self) -> Result<(&str, &str)> {
        let record = self
            .records
            .first()
            .ok_or_else(|| Error::Event("event carries no records".to_string()))?;
        if self.records.len() > 1 {
            warn!(
                "Event carries {} records, only the first is handled",
                self.records.len()
            );
        }
        Ok((&record.s3.bucket.name, &record.s3.object.key))
    }
}

/// What one handled email produced.
#[derive(Debug, Clone)]
pub struct HandledEmail {
    pub email: ParsedEmail,
    pub verdict: Verdict,
    pub reply: OutgoingMessage,
}

/// Fetches a stored email, classifies it and replies to its sender.
pub struct Responder<S, I, M> {
    store: S,
    classifier: Classifier<I>,
    mailer: M,
    reply: ReplyConfig,
}

impl<S, I, M> Responder<S, I, M>
where
    S: ObjectStore,
    I: InferenceClient,
    M: Mailer,
{
    pub fn new(store: S, classifier: Classifier<I>, mailer: M, reply: ReplyConfig) -> Self {
        Self {
            store,
            classifier,
            mailer,
            reply,
        }
    }

    pub async fn handle_event(&self, event: &StorageEvent) -> Result<HandledEmail> {
        let (bucket, key) = event.object_location()?;
        info!("Handling object {}/{}", bucket, key);

        let raw = self.store.get_object(bucket, key).await?;
        self.handle_raw(&raw).await
    }

    pub async fn handle_raw(&self, raw: &str) -> Result<HandledEmail> {
        let email = ParsedEmail::parse(raw);
        let (sender, receiver) = reply_addresses(&email)?;

        info!(
            "Email summary: from={} to={} date={} subject={} sample={:?}",
            sender,
            receiver,
            email.date.as_deref().unwrap_or("-"),
            email.subject.as_deref().unwrap_or("-"),
            email.body_sample(self.reply.sample_length)
        );

        let verdict = self.classifier.classify(&email.body).await?;
        info!(
            "Classified as {} with {}% confidence",
            verdict.label,
            verdict.confidence_percent()
        );

        let reply = OutgoingMessage {
            source: receiver.to_string(),
            destination: sender.to_string(),
            subject: format!("Re: {}", email.subject.as_deref().unwrap_or_default()),
            body: compose_reply(&email, &verdict, &self.reply),
        };
        self.mailer.send(&reply).await?;
        info!("Reply sent to {}", reply.destination);

        Ok(HandledEmail {
            email,
            verdict,
            reply,
        })
    }
}

fn reply_addresses(email: &ParsedEmail) -> Result<(&str, &str)> {
    let sender = email
        .from
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Message("missing From header".to_string()))?;
    let receiver = email
        .to
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Message("missing To header".to_string()))?;
    Ok((sender, receiver))
}

pub fn compose_reply(email: &ParsedEmail, verdict: &Verdict, reply: &ReplyConfig) -> String {
    format!(
        "We received your email sent at {date} with the subject {subject}.\n\
         \n\
         Here is a {length} character sample of the email body: {sample}\n\
         \n\
         The email was categorized as {label} with {confidence}% confidence.\n\
         \n\
         Best Regards,\n\
         {signature}\n",
        date = email.date.as_deref().unwrap_or("an unknown time"),
        subject = email.subject.as_deref().unwrap_or_default(),
        length = reply.sample_length,
        sample = email.body_sample(reply.sample_length),
        label = verdict.label,
        confidence = verdict.confidence_percent(),
        signature = reply.signature,
    )
}
