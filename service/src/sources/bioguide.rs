//! Adapter for the congressional biographical directory.
//!
//! One JSON document per member at `{base}/{id}.json`. The directory is the
//! richest source for names (including unaccented variants) and carries one
//! job position per congress with party affiliation spans.

use std::sync::Arc;

use legisync_engine::dates::{normalize_date, DateDirection};
use legisync_engine::model::{Chamber, Gender, MemberRecord, PartySpan, RoleRecord, Source};
use serde::Deserialize;
use tracing::debug;

use super::{FetchedMember, SourceError, SourceTransport, TransportError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BioguideProfile {
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    middle_name: String,
    #[serde(default)]
    family_name: String,
    #[serde(default)]
    suffix_name: String,
    #[serde(default)]
    nick_name: String,
    #[serde(default)]
    unaccented_given_name: String,
    #[serde(default)]
    unaccented_family_name: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    birth_date: String,
    #[serde(default)]
    official_website_url: String,
    #[serde(default)]
    job_positions: Vec<JobPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobPosition {
    job: Job,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    congress_affiliation: Option<CongressAffiliation>,
    senator_class: Option<u8>,
    district: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Job {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CongressAffiliation {
    congress: Option<CongressRef>,
    represents: Option<Represents>,
    #[serde(default)]
    party_affiliation: Vec<PartyAffiliation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CongressRef {
    congress_number: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Represents {
    #[serde(default)]
    region_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartyAffiliation {
    party: PartyRef,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct PartyRef {
    #[serde(default)]
    name: String,
}

/// Fetches and normalizes biographical directory profiles.
pub struct BioguideAdapter {
    base_url: String,
    transport: Arc<dyn SourceTransport>,
}

impl BioguideAdapter {
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn SourceTransport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// Fetch one member's profile and map it into the common shape.
    ///
    /// # Errors
    /// `NotFound` when the directory has no entry for the id, `Malformed` on
    /// an unparseable payload, `Transport` otherwise.
    pub async fn fetch_member(&self, id: &str) -> Result<FetchedMember, SourceError> {
        let url = format!("{}/{id}.json", self.base_url);

        let bytes = match self.transport.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(TransportError::Status { status: 404, .. }) => {
                return Err(SourceError::NotFound {
                    source: Source::Bioguide,
                    id: id.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        let profile: BioguideProfile =
            serde_json::from_slice(&bytes).map_err(|err| SourceError::Malformed {
                source: Source::Bioguide,
                detail: err.to_string(),
            })?;

        Ok(map_profile(id, &profile))
    }
}

fn map_profile(id: &str, profile: &BioguideProfile) -> FetchedMember {
    let mut record = MemberRecord::new(id);
    record.first_name = profile.given_name.clone();
    record.middle_name = profile.middle_name.clone();
    record.last_name = profile.family_name.clone();
    record.suffix = profile.suffix_name.clone();
    record.nickname = profile.nick_name.clone();
    record.unaccented_first_name = profile.unaccented_given_name.clone();
    record.unaccented_last_name = profile.unaccented_family_name.clone();
    record.gender = Gender::parse(&profile.gender);
    if !profile.birth_date.is_empty() {
        record.birthday = normalize_date(&profile.birth_date, DateDirection::Start);
    }
    record.website = profile.official_website_url.clone();

    let roles = profile
        .job_positions
        .iter()
        .filter_map(|position| map_position(id, position))
        .collect();

    FetchedMember { record, roles }
}

fn map_position(id: &str, position: &JobPosition) -> Option<RoleRecord> {
    let chamber = match position.job.name.as_str() {
        "Senator" => Chamber::Senate,
        "Representative" => Chamber::House,
        other => {
            // Delegates, resident commissioners etc. are out of scope.
            debug!(id, job = other, "skipping non-voting job position");
            return None;
        }
    };

    let affiliation = position.congress_affiliation.as_ref();
    let congress = affiliation
        .and_then(|a| a.congress.as_ref())
        .and_then(|c| c.congress_number);
    let Some(congress) = congress else {
        debug!(id, "skipping job position without congress number");
        return None;
    };

    let parties = affiliation
        .map(|a| {
            a.party_affiliation
                .iter()
                .map(|p| PartySpan {
                    party: p.party.name.clone(),
                    start_date: normalize_date(&p.start_date, DateDirection::Start),
                    end_date: normalize_date(&p.end_date, DateDirection::End),
                })
                .collect()
        })
        .unwrap_or_default();

    let state = affiliation
        .and_then(|a| a.represents.as_ref())
        .map(|r| r.region_code.clone())
        .unwrap_or_default();

    Some(RoleRecord {
        congress_numbers: [congress].into_iter().collect(),
        chamber,
        start_date: normalize_date(&position.start_date, DateDirection::Start),
        end_date: normalize_date(&position.end_date, DateDirection::End),
        parties,
        state,
        senator_class: match chamber {
            Chamber::Senate => position.senator_class,
            Chamber::House => None,
        },
        district: match chamber {
            Chamber::House => position.district,
            Chamber::Senate => None,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    fn profile_json() -> serde_json::Value {
        json!({
            "usCongressBioId": "S000622",
            "givenName": "John",
            "familyName": "Smith",
            "suffixName": "Jr.",
            "unaccentedGivenName": "John",
            "unaccentedFamilyName": "Smith",
            "gender": "Male",
            "birthDate": "1952",
            "officialWebsiteUrl": "https://www.smith.senate.gov",
            "jobPositions": [
                {
                    "job": { "name": "Senator" },
                    "startDate": "2019-01-03",
                    "endDate": "2021-01-03",
                    "senatorClass": 2,
                    "congressAffiliation": {
                        "congress": { "congressNumber": 116 },
                        "represents": { "regionCode": "TN" },
                        "partyAffiliation": [
                            {
                                "party": { "name": "Republican" },
                                "startDate": "2019-01-03",
                                "endDate": "2021-01-03"
                            }
                        ]
                    }
                },
                {
                    "job": { "name": "Delegate" },
                    "startDate": "2015-01-03",
                    "endDate": "2017-01-03",
                    "congressAffiliation": { "congress": { "congressNumber": 114 } }
                }
            ]
        })
    }

    #[tokio::test]
    async fn parses_profile_into_common_shape() {
        let transport = Arc::new(MockTransport::new());
        transport.stub_json("https://bio.test/S000622.json", &profile_json());

        let adapter = BioguideAdapter::new("https://bio.test", transport);
        let fetched = adapter.fetch_member("S000622").await.unwrap();

        assert_eq!(fetched.record.id, "S000622");
        assert_eq!(fetched.record.first_name, "John");
        assert_eq!(fetched.record.suffix, "Jr.");
        assert_eq!(fetched.record.gender, Gender::Male);
        assert_eq!(fetched.record.birthday, "1952-00-00");
        assert_eq!(fetched.record.website, "https://www.smith.senate.gov");

        // The delegate position is skipped.
        assert_eq!(fetched.roles.len(), 1);
        let role = &fetched.roles[0];
        assert_eq!(role.chamber, Chamber::Senate);
        assert_eq!(role.state, "TN");
        assert_eq!(role.senator_class, Some(2));
        assert_eq!(role.district, None);
        assert_eq!(
            role.congress_numbers.iter().copied().collect::<Vec<_>>(),
            vec![116]
        );
        assert_eq!(role.parties.len(), 1);
        assert_eq!(role.parties[0].party, "Republican");
    }

    #[tokio::test]
    async fn missing_end_date_becomes_open_sentinel() {
        let mut profile = profile_json();
        profile["jobPositions"][0]["endDate"] = json!("");

        let transport = Arc::new(MockTransport::new());
        transport.stub_json("https://bio.test/S000622.json", &profile);

        let adapter = BioguideAdapter::new("https://bio.test", transport);
        let fetched = adapter.fetch_member("S000622").await.unwrap();

        assert_eq!(fetched.roles[0].end_date, legisync_engine::dates::OPEN_END);
    }

    #[tokio::test]
    async fn http_404_maps_to_not_found() {
        let transport = Arc::new(MockTransport::new());
        let adapter = BioguideAdapter::new("https://bio.test", transport);

        let err = adapter.fetch_member("Z999999").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { id, .. } if id == "Z999999"));
    }

    #[tokio::test]
    async fn garbage_payload_maps_to_malformed() {
        let transport = Arc::new(MockTransport::new());
        transport.stub("https://bio.test/S000622.json", b"not json".to_vec());

        let adapter = BioguideAdapter::new("https://bio.test", transport);
        let err = adapter.fetch_member("S000622").await.unwrap_err();

        assert!(matches!(
            err,
            SourceError::Malformed { source: Source::Bioguide, .. }
        ));
    }
}
