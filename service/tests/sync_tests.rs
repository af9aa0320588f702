//! End-to-end sync cycle tests over scripted transports.
//!
//! These drive the full orchestrator (adapters, cache, store, resolver) with
//! a `MockTransport` and a `FixedClock`, so every cycle is deterministic.

use std::sync::Arc;

use legisync_api::clock::FixedClock;
use legisync_api::sources::mock::MockTransport;
use legisync_api::sources::{
    BioguideAdapter, DatasetCache, GovtrackAdapter, UnitedstatesAdapter,
};
use legisync_api::store::{MemberStore, MemoryStore};
use legisync_api::sync::{OverridePayload, SourceAdapters, SyncError, SyncOrchestrator};
use legisync_engine::model::MemberRecord;
use serde_json::json;

const BIO_BASE: &str = "https://bio.test";
const GT_BASE: &str = "https://gt.test";
const DATASET_URL: &str = "https://us.test/legislators-current.json";
const PHOTO_BASE: &str = "https://photos.test";

fn bioguide_url(id: &str) -> String {
    format!("{BIO_BASE}/{id}.json")
}

fn govtrack_url(id: &str) -> String {
    format!("{GT_BASE}/role?person__bioguideid={id}&limit=600")
}

fn photo_url(id: &str) -> String {
    format!("{PHOTO_BASE}/{id}.jpg")
}

struct Harness {
    transport: Arc<MockTransport>,
    store: Arc<MemoryStore>,
    orchestrator: SyncOrchestrator,
}

fn harness() -> Harness {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(1_700_000_000_000));

    let adapters = SourceAdapters {
        bioguide: BioguideAdapter::new(BIO_BASE, transport.clone()),
        govtrack: GovtrackAdapter::new(GT_BASE, transport.clone()),
        unitedstates: UnitedstatesAdapter::new(
            DATASET_URL,
            transport.clone(),
            Arc::new(DatasetCache::new(24)),
            clock.clone(),
        ),
    };

    let orchestrator = SyncOrchestrator::new(
        adapters,
        transport.clone(),
        store.clone(),
        clock,
        PHOTO_BASE,
        3,
    );

    Harness {
        transport,
        store,
        orchestrator,
    }
}

fn bioguide_profile() -> serde_json::Value {
    json!({
        "usCongressBioId": "S000622",
        "givenName": "John",
        "familyName": "Smith",
        "gender": "Male",
        "birthDate": "1952-01-03",
        "jobPositions": [{
            "job": { "name": "Senator" },
            "startDate": "2019-01-03",
            "endDate": "2021-01-03",
            "senatorClass": 2,
            "congressAffiliation": {
                "congress": { "congressNumber": 116 },
                "represents": { "regionCode": "TN" },
                "partyAffiliation": [{
                    "party": { "name": "Republican" },
                    "startDate": "2019-01-03",
                    "endDate": "2021-01-03"
                }]
            }
        }]
    })
}

fn govtrack_roles() -> serde_json::Value {
    json!({
        "objects": [{
            "role_type": "senator",
            "startdate": "2021-01-03",
            "enddate": "2023-01-03",
            "party": "Republican",
            "state": "TN",
            "senator_class": 2,
            "congress_numbers": [117],
            "person": { "firstname": "Jon", "lastname": "Smith" }
        }]
    })
}

fn stub_member(h: &Harness) {
    h.transport.stub_json(&bioguide_url("S000622"), &bioguide_profile());
    h.transport.stub_json(&govtrack_url("S000622"), &govtrack_roles());
    h.transport.stub_json(DATASET_URL, &json!([]));
    h.transport.stub(photo_url("S000622"), b"jpeg".to_vec());
}

#[tokio::test]
async fn first_cycle_builds_projection_with_precedence_and_role_union() {
    let h = harness();
    stub_member(&h);

    let aggregate = h.orchestrator.sync_member("S000622", None).await.unwrap();

    // Bioguide outranks GovTrack and "Jon" is no prefix extension of "John".
    assert_eq!(aggregate.projection.first_name, "John");
    assert_eq!(aggregate.projection.last_name, "Smith");
    assert_eq!(aggregate.projection.birthday, "1952-01-03");

    // Snapshots keep each source's own view.
    assert_eq!(aggregate.bioguide.record.first_name, "John");
    assert_eq!(aggregate.govtrack.record.first_name, "Jon");
    assert_eq!(aggregate.bioguide.record.fail_count, 0);
    assert!(aggregate.bioguide.record.update_timestamp > 0);

    // The dataset had no entry: counted as a failure, cycle unaffected.
    assert_eq!(aggregate.unitedstates.record.fail_count, 1);
    assert_eq!(aggregate.unitedstates.record.update_timestamp, 0);

    // Consecutive terms from different sources collapse into one role.
    assert_eq!(aggregate.projection_roles.len(), 1);
    let role = &aggregate.projection_roles[0];
    assert_eq!(role.start_date, "2019-01-03");
    assert_eq!(role.end_date, "2023-01-03");
    assert_eq!(
        role.congress_numbers.iter().copied().collect::<Vec<_>>(),
        vec![116, 117]
    );

    // Portrait probe succeeded and was recorded.
    assert_eq!(aggregate.profile_picture_uri, photo_url("S000622"));

    // Cycle result is persisted.
    let stored = h.store.get("S000622").await.unwrap().unwrap();
    assert_eq!(stored, aggregate);
}

#[tokio::test]
async fn resync_with_unchanged_upstream_is_idempotent() {
    let h = harness();
    stub_member(&h);
    // All three upstreams succeed so both cycles see identical data.
    h.transport.stub_json(
        DATASET_URL,
        &json!([{
            "id": { "bioguide": "S000622" },
            "name": { "first": "John", "last": "Smith" },
            "bio": { "gender": "M", "birthday": "1952-01-03" },
            "terms": [{
                "type": "sen",
                "start": "2019-01-03",
                "end": "2021-01-03",
                "state": "TN",
                "class": 2,
                "party": "Republican"
            }]
        }]),
    );

    let first = h.orchestrator.sync_member("S000622", None).await.unwrap();
    let second = h.orchestrator.sync_member("S000622", None).await.unwrap();

    assert_eq!(second, first, "second cycle over identical data must be a no-op");
}

#[tokio::test]
async fn override_wins_and_synced_value_is_preserved() {
    let h = harness();
    stub_member(&h);

    let mut record = MemberRecord::new("S000622");
    record.first_name = "X".into();
    let payload = OverridePayload {
        id: "S000622".into(),
        record,
    };

    let aggregate = h
        .orchestrator
        .sync_member("S000622", Some(payload))
        .await
        .unwrap();

    assert_eq!(aggregate.projection.first_name, "X");
    assert_eq!(aggregate.override_conflicts.len(), 1);
    assert_eq!(aggregate.override_conflicts[0].field, "first_name");
    assert_eq!(aggregate.override_conflicts[0].override_value, "X");
    assert_eq!(aggregate.override_conflicts[0].synced_value, "John");

    // Overrides persist across cycles through the user snapshot.
    let next = h.orchestrator.sync_member("S000622", None).await.unwrap();
    assert_eq!(next.projection.first_name, "X");
}

#[tokio::test]
async fn override_for_wrong_member_is_rejected() {
    let h = harness();
    stub_member(&h);

    let payload = OverridePayload {
        id: "B001288".into(),
        record: MemberRecord::new("B001288"),
    };

    let err = h
        .orchestrator
        .sync_member("S000622", Some(payload))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::IdMismatch { .. }));
    // Nothing was persisted for the rejected cycle.
    assert!(h.store.get("S000622").await.unwrap().is_none());
}

#[tokio::test]
async fn never_successful_source_is_suppressed_after_three_failures() {
    let h = harness();
    // No stubs at all: every upstream fetch fails, including the portrait.

    for _ in 0..3 {
        h.orchestrator.sync_member("S000622", None).await.unwrap();
    }

    let after_three = h.store.get("S000622").await.unwrap().unwrap();
    assert_eq!(after_three.bioguide.record.fail_count, 3);
    assert_eq!(after_three.govtrack.record.fail_count, 3);
    assert_eq!(after_three.unitedstates.record.fail_count, 3);
    assert_eq!(after_three.picture_fail_count, 3);

    let calls_before = h.transport.calls().len();
    let fourth = h.orchestrator.sync_member("S000622", None).await.unwrap();

    assert_eq!(
        h.transport.calls().len(),
        calls_before,
        "fourth cycle must not fetch suppressed sources"
    );
    assert_eq!(fourth.bioguide.record.fail_count, 3, "fail count unchanged");
    assert_eq!(fourth.govtrack.record.fail_count, 3);
    assert_eq!(fourth.unitedstates.record.fail_count, 3);
}

#[tokio::test]
async fn previously_successful_source_keeps_being_retried() {
    let h = harness();
    stub_member(&h);

    h.orchestrator.sync_member("S000622", None).await.unwrap();

    // Upstream goes dark after one success.
    h.transport.fail(bioguide_url("S000622"), 503);
    for _ in 0..4 {
        h.orchestrator.sync_member("S000622", None).await.unwrap();
    }

    let aggregate = h.store.get("S000622").await.unwrap().unwrap();
    assert_eq!(aggregate.bioguide.record.fail_count, 4);
    assert!(aggregate.bioguide.record.update_timestamp > 0);

    // Snapshot data from the earlier success is still serving the projection.
    assert_eq!(aggregate.projection.first_name, "John");

    // A recovery resets the failure count.
    h.transport.stub_json(&bioguide_url("S000622"), &bioguide_profile());
    let recovered = h.orchestrator.sync_member("S000622", None).await.unwrap();
    assert_eq!(recovered.bioguide.record.fail_count, 0);
}

#[tokio::test]
async fn portrait_is_fetched_only_until_recorded() {
    let h = harness();
    stub_member(&h);

    h.orchestrator.sync_member("S000622", None).await.unwrap();
    h.orchestrator.sync_member("S000622", None).await.unwrap();

    let photo_calls = h
        .transport
        .calls()
        .into_iter()
        .filter(|url| url == &photo_url("S000622"))
        .count();
    assert_eq!(photo_calls, 1, "recorded portrait URI must not be re-probed");
}

#[tokio::test]
async fn sync_members_prewarms_dataset_once() {
    let h = harness();

    let dataset = json!([
        {
            "id": { "bioguide": "A000360" },
            "name": { "first": "Lamar", "last": "Alexander" },
            "bio": { "gender": "M" },
            "terms": [{
                "type": "sen",
                "start": "2019-01-03",
                "end": "2021-01-03",
                "state": "TN",
                "class": 2,
                "party": "Republican"
            }]
        },
        {
            "id": { "bioguide": "B001288" },
            "name": { "first": "Cory", "last": "Booker" },
            "bio": { "gender": "M" },
            "terms": [{
                "type": "sen",
                "start": "2021-01-03",
                "end": "2027-01-03",
                "state": "NJ",
                "class": 1,
                "party": "Democrat"
            }]
        }
    ]);
    h.transport.stub_json(DATASET_URL, &dataset);

    let ids: Vec<String> = vec!["A000360".into(), "B001288".into()];
    let aggregates = h.orchestrator.sync_members(&ids).await.unwrap();

    assert_eq!(aggregates.len(), 2);
    assert_eq!(aggregates[0].projection.first_name, "Lamar");
    assert_eq!(aggregates[1].projection.first_name, "Cory");

    let dataset_calls = h
        .transport
        .calls()
        .into_iter()
        .filter(|url| url == DATASET_URL)
        .count();
    assert_eq!(dataset_calls, 1, "bulk dataset fetched once for the batch");
}
