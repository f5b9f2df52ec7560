use clubs_api::db::{MemoryDb, UserStore};
use clubs_api::models::{ClubUpdate, NewUser};
use clubs_api::services::MembershipService;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn benchmark_membership_updates(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to build runtime");

    let db = MemoryDb::new();
    let user = rt
        .block_on(db.create(NewUser {
            external_id: "bench".to_string(),
            external_token: "token".to_string(),
            display_name: "Bench".to_string(),
            email: "bench@example.com".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }))
        .expect("Failed to create user");

    // Give the user a realistically long club list
    for i in 0..200 {
        rt.block_on(db.update_clubs(&user.id, ClubUpdate::AddToSet(format!("club-{i}"))))
            .expect("Failed to seed clubs");
    }

    let service = MembershipService::new(Arc::new(db));

    let mut group = c.benchmark_group("membership");

    group.bench_function("add_existing_club", |b| {
        b.iter(|| rt.block_on(service.add_club(black_box(&user.id), black_box("club-100"))))
    });

    group.bench_function("add_then_remove_club", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.add_club(&user.id, "new-club").await.unwrap();
                service.remove_club(&user.id, "new-club").await.unwrap()
            })
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_membership_updates);
criterion_main!(benches);
