//! Adapter for the GovTrack role API.
//!
//! One query per member: `{base}/role?person__bioguideid={id}&limit=600`.
//! Every returned role object embeds the person, so a single fetch yields
//! both the biographical scalars and the role history. Contact fields
//! (website, phone, office) are taken from the most recent role.

use std::sync::Arc;

use legisync_engine::dates::{normalize_date, DateDirection};
use legisync_engine::model::{Chamber, Gender, MemberRecord, PartySpan, RoleRecord, Source};
use serde::Deserialize;
use tracing::debug;

use super::{FetchedMember, SourceError, SourceTransport};

#[derive(Debug, Deserialize)]
struct RolesResponse {
    #[serde(default)]
    objects: Vec<GovtrackRole>,
}

#[derive(Debug, Deserialize)]
struct GovtrackRole {
    #[serde(default)]
    role_type: String,
    #[serde(default)]
    startdate: String,
    #[serde(default)]
    enddate: String,
    #[serde(default)]
    party: String,
    #[serde(default)]
    state: String,
    district: Option<u16>,
    senator_class: Option<u8>,
    #[serde(default)]
    congress_numbers: Vec<u16>,
    #[serde(default)]
    website: String,
    #[serde(default)]
    phone: String,
    extra: Option<RoleExtra>,
    person: Option<GovtrackPerson>,
}

#[derive(Debug, Deserialize)]
struct RoleExtra {
    #[serde(default)]
    office: String,
}

#[derive(Debug, Deserialize)]
struct GovtrackPerson {
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    middlename: String,
    #[serde(default)]
    lastname: String,
    #[serde(default)]
    namemod: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    birthday: String,
    #[serde(default)]
    twitterid: String,
    #[serde(default)]
    youtubeid: String,
}

/// Fetches and normalizes GovTrack role history.
pub struct GovtrackAdapter {
    base_url: String,
    transport: Arc<dyn SourceTransport>,
}

impl GovtrackAdapter {
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn SourceTransport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// Fetch one member's roles and map them into the common shape.
    ///
    /// # Errors
    /// `NotFound` when GovTrack returns no roles for the id, `Malformed` on
    /// an unparseable payload, `Transport` otherwise.
    pub async fn fetch_member(&self, id: &str) -> Result<FetchedMember, SourceError> {
        let url = format!(
            "{}/role?person__bioguideid={id}&limit=600",
            self.base_url
        );

        let bytes = self.transport.fetch(&url).await?;

        let response: RolesResponse =
            serde_json::from_slice(&bytes).map_err(|err| SourceError::Malformed {
                source: Source::Govtrack,
                detail: err.to_string(),
            })?;

        if response.objects.is_empty() {
            return Err(SourceError::NotFound {
                source: Source::Govtrack,
                id: id.to_string(),
            });
        }

        Ok(map_roles(id, &response.objects))
    }
}

fn map_roles(id: &str, objects: &[GovtrackRole]) -> FetchedMember {
    let mut record = MemberRecord::new(id);

    if let Some(person) = objects.iter().find_map(|r| r.person.as_ref()) {
        record.first_name = person.firstname.clone();
        record.middle_name = person.middlename.clone();
        record.last_name = person.lastname.clone();
        record.suffix = person.namemod.clone();
        record.nickname = person.nickname.clone();
        record.gender = Gender::parse(&person.gender);
        if !person.birthday.is_empty() {
            record.birthday = normalize_date(&person.birthday, DateDirection::Start);
        }
        record.twitter = person.twitterid.clone();
        record.youtube = person.youtubeid.clone();
    }

    // Contact details follow the member's latest role.
    if let Some(latest) = objects.iter().max_by(|a, b| a.enddate.cmp(&b.enddate)) {
        record.website = latest.website.clone();
        record.phone = latest.phone.clone();
        record.office = latest
            .extra
            .as_ref()
            .map(|e| e.office.clone())
            .unwrap_or_default();
    }

    let roles = objects
        .iter()
        .filter_map(|role| map_role(id, role))
        .collect();

    FetchedMember { record, roles }
}

fn map_role(id: &str, role: &GovtrackRole) -> Option<RoleRecord> {
    let chamber = match role.role_type.as_str() {
        "senator" => Chamber::Senate,
        "representative" => Chamber::House,
        other => {
            debug!(id, role_type = other, "skipping unsupported role type");
            return None;
        }
    };

    if role.congress_numbers.is_empty() {
        debug!(id, "skipping role without congress numbers");
        return None;
    }

    let start_date = normalize_date(&role.startdate, DateDirection::Start);
    let end_date = normalize_date(&role.enddate, DateDirection::End);

    let parties = if role.party.is_empty() {
        Vec::new()
    } else {
        vec![PartySpan {
            party: role.party.clone(),
            start_date: start_date.clone(),
            end_date: end_date.clone(),
        }]
    };

    Some(RoleRecord {
        congress_numbers: role.congress_numbers.iter().copied().collect(),
        chamber,
        start_date,
        end_date,
        parties,
        state: role.state.clone(),
        senator_class: match chamber {
            Chamber::Senate => role.senator_class,
            Chamber::House => None,
        },
        district: match chamber {
            Chamber::House => role.district,
            Chamber::Senate => None,
        },
    })
}
