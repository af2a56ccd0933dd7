use quiz_core::model::{Lesson, LessonId, Profile, Question, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{LessonRepository, ProfileRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_lesson(id: u64, statements: &[&str]) -> Lesson {
    let questions = statements
        .iter()
        .map(|s| {
            Question::new(
                *s,
                vec!["yes".to_string(), "no".to_string(), "maybe".to_string()],
                2,
            )
            .unwrap()
        })
        .collect();
    Lesson::new(LessonId::new(id), format!("Lesson {id}"), "desc", 40, questions).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_question_order() {
    let repo = connect("memdb_lesson_roundtrip").await;
    let lesson = build_lesson(1, &["first", "second", "third"]);
    repo.upsert_lesson(&lesson).await.unwrap();

    let fetched = repo
        .get_lesson(LessonId::new(1))
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(fetched, lesson);
    let statements: Vec<&str> = fetched.questions().iter().map(|q| q.statement()).collect();
    assert_eq!(statements, vec!["first", "second", "third"]);

    assert!(repo.get_lesson(LessonId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upsert_replaces_questions() {
    let repo = connect("memdb_lesson_replace").await;
    repo.upsert_lesson(&build_lesson(3, &["a", "b", "c"]))
        .await
        .unwrap();
    repo.upsert_lesson(&build_lesson(3, &["only"])).await.unwrap();
    repo.upsert_lesson(&build_lesson(2, &["x"])).await.unwrap();

    let fetched = repo.get_lesson(LessonId::new(3)).await.unwrap().unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched.questions()[0].statement(), "only");

    let listed = repo.list_lessons(10).await.unwrap();
    let ids: Vec<u64> = listed.iter().map(|l| l.id().value()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn sqlite_add_points_increments_balance() {
    let repo = connect("memdb_profile_points").await;
    let user = UserId::new(5);

    let err = repo.add_points(user, 10, fixed_now()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let profile = Profile::new(user, "Grace", 100, fixed_now()).unwrap();
    repo.upsert_profile(&profile).await.unwrap();

    let total = repo.add_points(user, 25, fixed_now()).await.unwrap();
    assert_eq!(total, 125);

    let stored = repo.get_profile(user).await.unwrap().unwrap();
    assert_eq!(stored.points(), 125);
    assert_eq!(stored.display_name(), "Grace");
    assert_eq!(stored.updated_at(), fixed_now());
}
