//! Adapter for the unitedstates legislators bulk dataset.
//!
//! Unlike the per-member sources, this upstream publishes one JSON document
//! covering every current legislator. The document is fetched whole, indexed
//! by bioguide id, and cached process-wide in a [`DatasetCache`] with a
//! time-based validity window. The cache is an explicit injected value, not
//! ambient state, so tests drive expiry through the [`Clock`].

use std::collections::HashMap;
use std::sync::Arc;

use legisync_engine::dates::{normalize_date, DateDirection};
use legisync_engine::model::{Chamber, Gender, MemberRecord, PartySpan, RoleRecord, Source};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;

use super::{FetchedMember, SourceError, SourceTransport};

#[derive(Debug, Clone, Deserialize)]
struct Legislator {
    id: LegislatorId,
    #[serde(default)]
    name: LegislatorName,
    #[serde(default)]
    bio: LegislatorBio,
    #[serde(default)]
    terms: Vec<LegislatorTerm>,
    #[serde(default)]
    social: LegislatorSocial,
}

#[derive(Debug, Clone, Deserialize)]
struct LegislatorId {
    #[serde(default)]
    bioguide: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LegislatorName {
    #[serde(default)]
    first: String,
    #[serde(default)]
    middle: String,
    #[serde(default)]
    last: String,
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    nickname: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LegislatorBio {
    #[serde(default)]
    gender: String,
    #[serde(default)]
    birthday: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LegislatorTerm {
    #[serde(rename = "type", default)]
    term_type: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(default)]
    state: String,
    district: Option<u16>,
    class: Option<u8>,
    #[serde(default)]
    party: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    office: String,
    #[serde(default)]
    phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LegislatorSocial {
    #[serde(default)]
    twitter: String,
    #[serde(default)]
    facebook: String,
    #[serde(default)]
    youtube: String,
}

struct CachedDataset {
    fetched_at: i64,
    by_id: HashMap<String, Legislator>,
}

/// Shared cache of the parsed bulk dataset.
///
/// Concurrent cold-cache fetches are not de-duplicated: two tasks racing an
/// empty cache both hit the upstream and the loser's copy wins, which is an
/// acceptable staleness window for a daily dataset.
pub struct DatasetCache {
    ttl_millis: i64,
    inner: Mutex<Option<CachedDataset>>,
}

impl DatasetCache {
    #[must_use]
    pub fn new(ttl_hours: u64) -> Self {
        let ttl_millis =
            i64::try_from(ttl_hours.saturating_mul(60 * 60 * 1000)).unwrap_or(i64::MAX);
        Self {
            ttl_millis,
            inner: Mutex::new(None),
        }
    }

    async fn lookup(
        &self,
        transport: &dyn SourceTransport,
        url: &str,
        clock: &dyn Clock,
        id: &str,
    ) -> Result<Option<Legislator>, SourceError> {
        let now = clock.now_millis();

        {
            let cached = self.inner.lock().await;
            if let Some(dataset) = cached.as_ref() {
                if now - dataset.fetched_at < self.ttl_millis {
                    return Ok(dataset.by_id.get(id).cloned());
                }
            }
        }
        // Lock released while fetching: a concurrent miss fetches again.

        let by_id = fetch_dataset(transport, url).await?;
        info!(members = by_id.len(), "legislators dataset refreshed");

        let mut cached = self.inner.lock().await;
        let hit = by_id.get(id).cloned();
        *cached = Some(CachedDataset {
            fetched_at: now,
            by_id,
        });
        Ok(hit)
    }

    /// Fetch the dataset now if the cached copy is missing or expired.
    ///
    /// # Errors
    /// Propagates transport/parse failures; the cache is left as-is.
    pub async fn prewarm(
        &self,
        transport: &dyn SourceTransport,
        url: &str,
        clock: &dyn Clock,
    ) -> Result<(), SourceError> {
        let now = clock.now_millis();

        {
            let cached = self.inner.lock().await;
            if let Some(dataset) = cached.as_ref() {
                if now - dataset.fetched_at < self.ttl_millis {
                    return Ok(());
                }
            }
        }

        let by_id = fetch_dataset(transport, url).await?;
        info!(members = by_id.len(), "legislators dataset pre-warmed");

        let mut cached = self.inner.lock().await;
        *cached = Some(CachedDataset {
            fetched_at: now,
            by_id,
        });
        Ok(())
    }
}

async fn fetch_dataset(
    transport: &dyn SourceTransport,
    url: &str,
) -> Result<HashMap<String, Legislator>, SourceError> {
    let bytes = transport.fetch(url).await?;

    let legislators: Vec<Legislator> =
        serde_json::from_slice(&bytes).map_err(|err| SourceError::Malformed {
            source: Source::Unitedstates,
            detail: err.to_string(),
        })?;

    Ok(legislators
        .into_iter()
        .filter(|l| !l.id.bioguide.is_empty())
        .map(|l| (l.id.bioguide.clone(), l))
        .collect())
}

/// Serves per-member lookups out of the cached bulk dataset.
pub struct UnitedstatesAdapter {
    dataset_url: String,
    transport: Arc<dyn SourceTransport>,
    cache: Arc<DatasetCache>,
    clock: Arc<dyn Clock>,
}

impl UnitedstatesAdapter {
    #[must_use]
    pub fn new(
        dataset_url: impl Into<String>,
        transport: Arc<dyn SourceTransport>,
        cache: Arc<DatasetCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dataset_url: dataset_url.into(),
            transport,
            cache,
            clock,
        }
    }

    /// Refresh the shared dataset copy if needed.
    ///
    /// # Errors
    /// Propagates transport/parse failures.
    pub async fn prewarm(&self) -> Result<(), SourceError> {
        self.cache
            .prewarm(self.transport.as_ref(), &self.dataset_url, self.clock.as_ref())
            .await
    }

    /// Look one member up in the (possibly refreshed) dataset.
    ///
    /// # Errors
    /// `NotFound` when the dataset has no entry for the id, `Malformed` /
    /// `Transport` when the dataset itself cannot be fetched.
    pub async fn fetch_member(&self, id: &str) -> Result<FetchedMember, SourceError> {
        let legislator = self
            .cache
            .lookup(
                self.transport.as_ref(),
                &self.dataset_url,
                self.clock.as_ref(),
                id,
            )
            .await?;

        legislator.map_or_else(
            || {
                Err(SourceError::NotFound {
                    source: Source::Unitedstates,
                    id: id.to_string(),
                })
            },
            |entry| Ok(map_legislator(id, &entry)),
        )
    }
}

/// Congress number for a term starting in `year` (the 1st Congress convened
/// in 1789, one congress per two years). The dataset does not carry congress
/// numbers on terms, so they are derived from the start year.
const fn congress_for_year(year: u16) -> u16 {
    (year - 1789) / 2 + 1
}

fn start_year(date: &str) -> Option<u16> {
    date.get(..4).and_then(|y| y.parse().ok())
}

fn map_legislator(id: &str, entry: &Legislator) -> FetchedMember {
    let mut record = MemberRecord::new(id);
    record.first_name = entry.name.first.clone();
    record.middle_name = entry.name.middle.clone();
    record.last_name = entry.name.last.clone();
    record.suffix = entry.name.suffix.clone();
    record.nickname = entry.name.nickname.clone();
    record.gender = Gender::parse(&entry.bio.gender);
    if !entry.bio.birthday.is_empty() {
        record.birthday = normalize_date(&entry.bio.birthday, DateDirection::Start);
    }
    record.twitter = entry.social.twitter.clone();
    record.facebook = entry.social.facebook.clone();
    record.youtube = entry.social.youtube.clone();

    // Contact details follow the latest term.
    if let Some(latest) = entry.terms.iter().max_by(|a, b| a.end.cmp(&b.end)) {
        record.website = latest.url.clone();
        record.office = latest.office.clone();
        record.phone = latest.phone.clone();
    }

    let roles = entry
        .terms
        .iter()
        .filter_map(|term| map_term(id, term))
        .collect();

    FetchedMember { record, roles }
}

fn map_term(id: &str, term: &LegislatorTerm) -> Option<RoleRecord> {
    let chamber = match term.term_type.as_str() {
        "sen" => Chamber::Senate,
        "rep" => Chamber::House,
        other => {
            debug!(id, term_type = other, "skipping unsupported term type");
            return None;
        }
    };

    let start_date = normalize_date(&term.start, DateDirection::Start);
    let end_date = normalize_date(&term.end, DateDirection::End);

    let Some(congress) = start_year(&start_date)
        .filter(|year| *year >= 1789)
        .map(congress_for_year)
    else {
        debug!(id, "skipping term without a usable start year");
        return None;
    };

    let parties = if term.party.is_empty() {
        Vec::new()
    } else {
        vec![PartySpan {
            party: term.party.clone(),
            start_date: start_date.clone(),
            end_date: end_date.clone(),
        }]
    };

    Some(RoleRecord {
        congress_numbers: [congress].into_iter().collect(),
        chamber,
        start_date,
        end_date,
        parties,
        state: term.state.clone(),
        senator_class: match chamber {
            Chamber::Senate => term.class,
            Chamber::House => None,
        },
        district: match chamber {
            Chamber::House => term.district,
            Chamber::Senate => None,
        },
    })
}
