//! Concurrent resolution and change-set accumulation
//!
//! Run with: cargo test --package phenotrack-resolve --test concurrency_tests

use phenotrack_graph::{vocab, EntityKind, Graph, Literal, ResolvedId, Triple};
use phenotrack_resolve::{
    ChangeSetAccumulator, Diagnostics, IdentityCache, IngestSession, Minted, ResolveRequest, ResolverConfig,
};
use phenotrack_test_utils::{scan_headers, MemoryGateway, ScanRow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolvers_agree_on_one_identifier() {
    const TASKS: usize = 16;

    let gateway = Arc::new(MemoryGateway::new());
    let (artifact, project) = gateway.add_project(1, "Project#2013-0015");
    gateway.set_query_delay(Duration::from_millis(20));
    let project = ResolvedId::canonical(project);
    let cache = Arc::new(IdentityCache::new(Arc::new(Diagnostics::new())));
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let request = ResolveRequest::new(EntityKind::Pot, "POT-07".into())
                .scoped(&project)
                .probe_barcode(&artifact);
            tokio::spawn(async move {
                barrier.wait().await;
                cache
                    .resolve(request, &*gateway, |_| {
                        Minted::new(ResolvedId::mint(EntityKind::Pot), Graph::new())
                    })
                    .await
                    .map(|record| record.id.clone())
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    assert!(ids.iter().all(|id| id == &ids[0]), "{ids:?}");
    assert!(ids[0].is_provisional());

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.published, 1);
    assert_eq!(stats.hits + stats.lost_races, (TASKS - 1) as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_lose_nothing() {
    const TASKS: usize = 32;

    let gateway = MemoryGateway::new();
    let (artifact, _) = gateway.add_project(1, "Project#2013-0015");
    let acc = Arc::new(ChangeSetAccumulator::new());

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let acc = Arc::clone(&acc);
            let artifact = artifact.clone();
            tokio::spawn(async move {
                let pot = ResolvedId::mint(EntityKind::Pot);
                let mut graph = Graph::new();
                graph.add(&pot, &vocab::RDF_TYPE, &*vocab::POT);
                graph.add(&pot, &vocab::HAS_BARCODE, Literal::plain(format!("POT-{i:02}")));
                acc.merge(&artifact, &graph);
                graph
            })
        })
        .collect();

    let mut expected = Vec::new();
    for handle in handles {
        expected.push(handle.await.unwrap());
    }
    let acc = Arc::try_unwrap(acc).unwrap();
    let queue = acc.into_queue();
    let merged = &queue[&artifact];
    assert_eq!(merged.len(), TASKS * 2);
    for graph in &expected {
        for triple in graph {
            assert!(merged.contains(triple));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_rows_share_tray_and_genotype() {
    let gateway = Arc::new(MemoryGateway::new());
    let (artifact, _) = gateway.add_project(1, "Project#2013-0015");
    gateway.set_query_delay(Duration::from_millis(5));
    let session = IngestSession::with_config(gateway.clone(), ResolverConfig::new().with_row_concurrency(8));

    let rows: Vec<Vec<String>> = (0..20)
        .map(|i| {
            ScanRow::example()
                .with("PlantID", format!("POT-{i:02}"))
                .with("PotNumber", i.to_string())
                .fields()
        })
        .collect();
    let outcomes = session.process(&scan_headers(), &rows).await.unwrap();

    assert_eq!(outcomes.len(), 20);
    assert!(outcomes.windows(2).all(|w| w[0].row < w[1].row));
    assert!(outcomes.iter().all(|o| o.tray == outcomes[0].tray));
    assert!(outcomes.iter().all(|o| o.genotype == outcomes[0].genotype));
    assert_eq!(session.identity().records(EntityKind::Tray).len(), 1);
    assert_eq!(session.identity().records(EntityKind::Pot).len(), 20);

    let (queue, _) = session.finish();
    let graph = &queue[&artifact];
    for o in &outcomes {
        assert!(graph.contains(&Triple::new(&o.tray, &vocab::HAS_POT, &o.pot)));
    }
    // losers of a mint race never leak their identifiers into the change-set
    assert_eq!(graph.subjects_of_type(&vocab::TRAY).len(), 1);
    assert_eq!(graph.subjects_of_type(&vocab::GENOTYPE).len(), 1);
}
