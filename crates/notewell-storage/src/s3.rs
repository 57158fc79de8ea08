//! S3-backed store. Every record is a JSON object under the key layout in
//! [`notewell_core::keys`]. A session's gap list is one object written with
//! ETag `If-Match` preconditions, so two writers racing on the same session
//! surface as [`StorageError::PreconditionFailed`] rather than a lost update.

use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use notewell_core::keys;
use notewell_core::models::gap::Gap;
use notewell_core::models::section::{MappedSectionContent, SectionUpdate};
use notewell_core::models::session::{Session, SessionStatus};
use notewell_core::models::template::TemplateSectionInfo;

use crate::error::StorageError;
use crate::store::{BoxFuture, GapStore, SectionStore, SessionStore, TemplateStore, sort_gaps};

const JSON: &str = "application/json";

/// Maps a gap or section id to the session that owns it.
#[derive(Debug, Serialize, Deserialize)]
struct OwnerPointer {
    session_id: Uuid,
}

/// How a JSON write is guarded.
enum Precondition<'a> {
    None,
    /// The object must still carry this ETag.
    IfMatch(&'a str),
    /// The object must not exist yet.
    IfAbsent,
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a store from the default AWS config chain.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Write a session record. Used by the application that owns sessions.
    pub async fn put_session(&self, session: &Session) -> Result<(), StorageError> {
        self.put_json(&keys::session(session.id), session, Precondition::None)
            .await
            .map(|_| ())
    }

    /// Write the mapped sections of a session, replacing any previous set.
    pub async fn put_sections(
        &self,
        session_id: Uuid,
        sections: &[MappedSectionContent],
    ) -> Result<(), StorageError> {
        if let Some(foreign) = sections.iter().find(|s| s.session_id != session_id) {
            return Err(StorageError::InvalidRecord(format!(
                "section {} belongs to session {}, not {session_id}",
                foreign.id, foreign.session_id
            )));
        }
        for section in sections {
            self.put_json(
                &keys::section_pointer(section.id),
                &OwnerPointer { session_id },
                Precondition::None,
            )
            .await?;
        }
        self.put_json(&keys::session_sections(session_id), &sections, Precondition::None)
            .await
            .map(|_| ())
    }

    pub async fn put_template_sections(
        &self,
        template_id: Uuid,
        sections: &[TemplateSectionInfo],
    ) -> Result<(), StorageError> {
        self.put_json(&keys::template_sections(template_id), &sections, Precondition::None)
            .await
            .map(|_| ())
    }

    /// Get a JSON object. Returns the value and its ETag, or None if the key
    /// does not exist.
    async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<(T, String)>, StorageError> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(StorageError::GetObject(err.to_string()));
            }
        };

        let etag = resp.e_tag().unwrap_or_default().to_string();
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetObject(e.to_string()))?
            .into_bytes();

        Ok(Some((serde_json::from_slice(&body)?, etag)))
    }

    /// Put a JSON object. Returns the new ETag.
    async fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        precondition: Precondition<'_>,
    ) -> Result<String, StorageError> {
        let body = serde_json::to_vec_pretty(value)?;
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(JSON)
            .body(ByteStream::from(body));

        req = match precondition {
            Precondition::None => req,
            Precondition::IfMatch(etag) => req.if_match(etag),
            Precondition::IfAbsent => req.if_none_match("*"),
        };

        let resp = req.send().await.map_err(|e| {
            let err = e.into_service_error();
            // S3 answers 412 Precondition Failed when the guard does not hold
            if err.to_string().contains("PreconditionFailed") {
                StorageError::PreconditionFailed {
                    key: key.to_string(),
                }
            } else {
                StorageError::PutObject(err.to_string())
            }
        })?;

        Ok(resp.e_tag().unwrap_or_default().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteObject(e.into_service_error().to_string()))?;
        Ok(())
    }

    async fn owner_of(&self, pointer_key: &str) -> Result<Option<Uuid>, StorageError> {
        Ok(self
            .get_json::<OwnerPointer>(pointer_key)
            .await?
            .map(|(p, _)| p.session_id))
    }

    /// Load a session's gap list with the ETag needed to write it back.
    async fn load_gaps(
        &self,
        session_id: Uuid,
    ) -> Result<(Vec<Gap>, Option<String>), StorageError> {
        Ok(match self.get_json(&keys::session_gaps(session_id)).await? {
            Some((gaps, etag)) => (gaps, Some(etag)),
            None => (Vec::new(), None),
        })
    }

    async fn save_gaps(
        &self,
        session_id: Uuid,
        gaps: &[Gap],
        etag: Option<&str>,
    ) -> Result<(), StorageError> {
        let precondition = match etag {
            Some(etag) => Precondition::IfMatch(etag),
            None => Precondition::IfAbsent,
        };
        self.put_json(&keys::session_gaps(session_id), gaps, precondition)
            .await?;
        Ok(())
    }

    /// Load the gap list that owns `gap_id`, with its ETag.
    async fn load_owning_gaps(
        &self,
        gap_id: Uuid,
    ) -> Result<Option<(Uuid, Vec<Gap>, Option<String>)>, StorageError> {
        let Some(session_id) = self.owner_of(&keys::gap_pointer(gap_id)).await? else {
            return Ok(None);
        };
        let (gaps, etag) = self.load_gaps(session_id).await?;
        Ok(Some((session_id, gaps, etag)))
    }
}

impl SessionStore for S3Store {
    fn get_session(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Session>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .get_json::<Session>(&keys::session(id))
                .await?
                .map(|(s, _)| s))
        })
    }

    fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let key = keys::session(id);
            let (mut session, etag) = self
                .get_json::<Session>(&key)
                .await?
                .ok_or_else(|| StorageError::not_found("session", id))?;
            session.status = status;
            session.updated_at = jiff::Timestamp::now();
            self.put_json(&key, &session, Precondition::IfMatch(&etag))
                .await?;
            Ok(())
        })
    }
}

impl SectionStore for S3Store {
    fn get_mapped_sections(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<MappedSectionContent>, StorageError>> {
        Box::pin(async move {
            let mut sections = self
                .get_json::<Vec<MappedSectionContent>>(&keys::session_sections(session_id))
                .await?
                .map(|(s, _)| s)
                .unwrap_or_default();
            sections.sort_by_key(|s| s.display_order);
            Ok(sections)
        })
    }

    fn update_section_content(
        &self,
        id: Uuid,
        update: SectionUpdate,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let session_id = self
                .owner_of(&keys::section_pointer(id))
                .await?
                .ok_or_else(|| StorageError::not_found("section", id))?;

            let key = keys::session_sections(session_id);
            let (mut sections, etag) = self
                .get_json::<Vec<MappedSectionContent>>(&key)
                .await?
                .ok_or_else(|| StorageError::not_found("section", id))?;

            let section = sections
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StorageError::not_found("section", id))?;
            update.apply_to(section);

            self.put_json(&key, &sections, Precondition::IfMatch(&etag))
                .await?;
            Ok(())
        })
    }
}

impl TemplateStore for S3Store {
    fn get_template_sections(
        &self,
        template_id: Uuid,
    ) -> BoxFuture<'_, Result<Option<Vec<TemplateSectionInfo>>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .get_json::<Vec<TemplateSectionInfo>>(&keys::template_sections(template_id))
                .await?
                .map(|(mut sections, _)| {
                    sections.sort_by_key(|s| s.display_order);
                    sections
                }))
        })
    }
}

impl GapStore for S3Store {
    fn list_gaps(
        &self,
        session_id: Uuid,
        include_resolved: bool,
    ) -> BoxFuture<'_, Result<Vec<Gap>, StorageError>> {
        Box::pin(async move {
            let (mut gaps, _) = self.load_gaps(session_id).await?;
            if !include_resolved {
                gaps.retain(|g| !g.is_resolved);
            }
            sort_gaps(&mut gaps);
            Ok(gaps)
        })
    }

    fn get_gap(&self, id: Uuid) -> BoxFuture<'_, Result<Option<Gap>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .load_owning_gaps(id)
                .await?
                .and_then(|(_, gaps, _)| gaps.into_iter().find(|g| g.id == id)))
        })
    }

    fn replace_unresolved_gaps(
        &self,
        session_id: Uuid,
        gaps: Vec<Gap>,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            if let Some(foreign) = gaps.iter().find(|g| g.session_id != session_id) {
                return Err(StorageError::InvalidRecord(format!(
                    "gap {} belongs to session {}, not {session_id}",
                    foreign.id, foreign.session_id
                )));
            }

            let (existing, etag) = self.load_gaps(session_id).await?;
            let (kept, dropped): (Vec<Gap>, Vec<Gap>) =
                existing.into_iter().partition(|g| g.is_resolved);

            for gap in &gaps {
                self.put_json(
                    &keys::gap_pointer(gap.id),
                    &OwnerPointer { session_id },
                    Precondition::None,
                )
                .await?;
            }

            let mut next = kept;
            next.extend(gaps);
            self.save_gaps(session_id, &next, etag.as_deref()).await?;

            for gap in &dropped {
                self.delete_object(&keys::gap_pointer(gap.id)).await?;
            }

            debug!(
                session_id = %session_id,
                dropped = dropped.len(),
                total = next.len(),
                "replaced unresolved gaps"
            );
            Ok(())
        })
    }

    fn resolve_gap(
        &self,
        id: Uuid,
        response: String,
        resolved_at: jiff::Timestamp,
    ) -> BoxFuture<'_, Result<Gap, StorageError>> {
        Box::pin(async move {
            let (session_id, mut gaps, etag) = self
                .load_owning_gaps(id)
                .await?
                .ok_or_else(|| StorageError::not_found("gap", id))?;

            let gap = gaps
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| StorageError::not_found("gap", id))?;
            gap.resolve(response, resolved_at);
            let resolved = gap.clone();

            self.save_gaps(session_id, &gaps, etag.as_deref()).await?;
            Ok(resolved)
        })
    }

    fn delete_gap(&self, id: Uuid) -> BoxFuture<'_, Result<bool, StorageError>> {
        Box::pin(async move {
            let Some((session_id, mut gaps, etag)) = self.load_owning_gaps(id).await? else {
                return Ok(false);
            };

            let before = gaps.len();
            gaps.retain(|g| g.id != id);
            let removed = gaps.len() < before;
            if removed {
                self.save_gaps(session_id, &gaps, etag.as_deref()).await?;
            }
            self.delete_object(&keys::gap_pointer(id)).await?;
            Ok(removed)
        })
    }
}
