use adapt_core::feedback::FeedbackCategory;
use adapt_core::graph::SkillGraph;
use adapt_core::model::{
    AttemptSubmission, Percentage, ProgressRecord, QuizId, SkillId, SkillStatus, UserId,
};
use adapt_core::time::fixed_now;
use chrono::Duration;
use storage::repository::{
    AttemptRepository, ProgressRepository, QuizCatalog, SkillCatalog, Storage, StorageError,
};
use storage::seed::{self, JAVASCRIPT_CORE, seed_demo_catalog};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    SqliteRepository::open(&url).await.expect("open")
}

async fn seeded(name: &str) -> (SqliteRepository, Storage) {
    let repo = connect(name).await;
    let storage = Storage::from(repo.clone());
    seed_demo_catalog(&storage).await.expect("seed");
    (repo, storage)
}

#[tokio::test]
async fn migrations_are_rerunnable() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn skills_round_trip_in_catalog_order() {
    let (repo, storage) = seeded("memdb_skills").await;
    // Second seed must not duplicate or reorder.
    seed_demo_catalog(&storage).await.unwrap();

    let skills = repo.list_skills().await.unwrap();
    let expected = seed::demo_catalog().unwrap().skills;
    assert_eq!(skills, expected);

    let js = repo.get_skill(JAVASCRIPT_CORE).await.unwrap();
    assert_eq!(js.name(), "JavaScript Core");
    assert!(js.prerequisites().contains(&SkillId::new(2)));

    assert!(matches!(
        repo.get_skill(SkillId::new(404)).await,
        Err(StorageError::NotFound)
    ));

    // The stored catalog forms a valid graph.
    SkillGraph::new(skills).unwrap();
}

#[tokio::test]
async fn quizzes_round_trip_with_questions() {
    let (repo, _storage) = seeded("memdb_quizzes").await;
    let expected = seed::demo_catalog().unwrap().quizzes;

    let quizzes = repo.list_quizzes().await.unwrap();
    assert_eq!(quizzes, expected);

    let js = repo.get_quiz(QuizId::new(3)).await.unwrap();
    assert_eq!(js.configured_sample_size(), Some(3));
    assert_eq!(js.questions().len(), 5);
    assert_eq!(js.linked_skill(), Some(JAVASCRIPT_CORE));
    assert!(js.questions()[0].explanation().is_some());

    assert!(matches!(
        repo.get_quiz(QuizId::new(99)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn progress_keeps_insertion_order_and_rejects_duplicates() {
    let (repo, _storage) = seeded("memdb_progress").await;
    let graph = SkillGraph::new(repo.list_skills().await.unwrap()).unwrap();
    let user = UserId::new(7);
    let records = graph.initialize_progress(user);

    repo.insert_progress(&records).await.unwrap();
    assert!(matches!(
        repo.insert_progress(&records[..1]).await,
        Err(StorageError::Conflict)
    ));

    let mut stored = repo.list_progress(user).await.unwrap();
    assert_eq!(stored, records);
    assert!(repo.list_progress(UserId::new(8)).await.unwrap().is_empty());

    stored[0].advance_to(SkillStatus::Completed).unwrap();
    repo.update_progress(&stored[0]).await.unwrap();
    let reloaded = repo.list_progress(user).await.unwrap();
    assert_eq!(reloaded[0].status(), SkillStatus::Completed);
    assert_eq!(reloaded[0].mastery(), Percentage::FULL);

    let stray = ProgressRecord::new(UserId::new(9), SkillId::new(1), SkillStatus::Locked);
    assert!(matches!(
        repo.update_progress(&stray).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn attempts_are_appended_and_listed_oldest_first() {
    let repo = connect("memdb_attempts").await;
    let user = UserId::new(3);
    let later = AttemptSubmission::new(user, QuizId::new(1), Percentage::new(85.0).unwrap(), 90);
    let earlier = AttemptSubmission::new(user, QuizId::new(2), Percentage::new(20.0).unwrap(), 40);

    let a = repo
        .append_attempt(&later, fixed_now() + Duration::minutes(5))
        .await
        .unwrap();
    let b = repo.append_attempt(&earlier, fixed_now()).await.unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(a.feedback(), FeedbackCategory::FastTrack);

    let listed = repo.list_attempts(user).await.unwrap();
    assert_eq!(listed, vec![b, a]);
    assert_eq!(listed[0].feedback(), FeedbackCategory::Remedial);
    assert!(repo.list_attempts(UserId::new(4)).await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_sqlite_constructor_wires_every_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    seed_demo_catalog(&storage).await.unwrap();
    assert_eq!(storage.skills.list_skills().await.unwrap().len(), 5);
    assert_eq!(storage.quizzes.list_quizzes().await.unwrap().len(), 4);
    assert!(storage.attempts.list_attempts(UserId::new(1)).await.unwrap().is_empty());
}
