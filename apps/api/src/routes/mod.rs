pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::compile::handlers as compile;
use crate::editing::handlers as editing;
use crate::render::handlers as render;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document store
        .route("/api/resume", get(resume::handle_get_resume))
        .route("/api/resume/apply-patch", post(resume::handle_apply_patch))
        .route("/api/resume/save", post(resume::handle_save_version))
        .route("/api/resume/versions", get(resume::handle_list_versions))
        .route("/api/resume/version/:id", get(resume::handle_get_version))
        // Edit proposals
        .route("/api/ai/edit-bullet", post(editing::handle_edit_bullet))
        .route("/api/ai/edit-section", post(editing::handle_edit_section))
        .route("/api/ai/tailor", post(editing::handle_tailor))
        // Rendering and compilation
        .route("/api/render", post(render::handle_render))
        .route("/api/compile", post(compile::handle_compile))
        .route("/pdfs/:file", get(compile::handle_get_pdf))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::compile::artifacts::LocalArtifactStore;
    use crate::compile::service::testing::{StubBehaviour, StubCompiler};
    use crate::compile::CompileService;
    use crate::editing::testing::StubGenerator;
    use crate::models::resume::fixtures::sample_resume;
    use crate::models::resume::VariantKey;
    use crate::render::LatexTemplate;
    use crate::store::{ResumeStore, SqliteStore};

    struct TestApp {
        router: Router,
        llm: Arc<StubGenerator>,
        _dir: TempDir,
    }

    async fn app_with(llm: StubGenerator, behaviour: StubBehaviour) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ResumeStore> = Arc::new(SqliteStore::in_memory().await);
        store
            .save_resume(&sample_resume(VariantKey::AiMl))
            .await
            .unwrap();

        let llm = Arc::new(llm);
        let compiler = CompileService::new(
            store.clone(),
            Arc::new(LocalArtifactStore::new(dir.path().join("pdfs"))),
            Arc::new(StubCompiler::new(behaviour)),
            dir.path().join("work"),
        );
        let state = AppState {
            store,
            llm: llm.clone(),
            compiler: Arc::new(compiler),
            template: Arc::new(LatexTemplate::embedded().unwrap()),
        };

        TestApp {
            router: build_router(state),
            llm,
            _dir: dir,
        }
    }

    async fn app() -> TestApp {
        app_with(StubGenerator::replying(json!({"patches": []})), StubBehaviour::Succeed).await
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app.router, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resumepilot");
    }

    #[tokio::test]
    async fn test_get_resume_and_variant_validation() {
        let app = app().await;

        let (status, body) = send(&app.router, get_req("/api/resume?variantKey=ai_ml")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["heading"]["name"], "Ada Lovelace");

        let (status, _) = send(&app.router, get_req("/api/resume?variantKey=full_stack")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app.router, get_req("/api/resume?variantKey=sales")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app.router, get_req("/api/resume")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_apply_patch_distinguishes_patch_and_schema_failures() {
        let app = app().await;

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/resume/apply-patch",
                json!({
                    "variantKey": "ai_ml",
                    "patches": [{"op": "remove", "path": "/experience/9"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "PATCH_INVALID");
        assert_eq!(body["error"]["details"][0]["index"], 0);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/resume/apply-patch",
                json!({
                    "variantKey": "ai_ml",
                    "patches": [{"op": "replace", "path": "/skills/languages", "value": "Rust"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "SCHEMA_INVALID");

        let (_, body) = send(&app.router, get_req("/api/resume?variantKey=ai_ml")).await;
        assert_eq!(body["skills"]["languages"], json!(["Rust", "Python"]));
    }

    #[tokio::test]
    async fn test_apply_patch_with_base_path() {
        let app = app().await;
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/resume/apply-patch",
                json!({
                    "variantKey": "ai_ml",
                    "basePath": "/experience/1",
                    "patches": [{"op": "replace", "path": "/role", "value": "Lead Engineer"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["resume"]["experience"][1]["role"], "Lead Engineer");
    }

    #[tokio::test]
    async fn test_apply_patch_requires_patches() {
        let app = app().await;
        let (status, _) = send(
            &app.router,
            post_json("/api/resume/apply-patch", json!({"variantKey": "ai_ml"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_typed_body_fields_are_structured_validation_errors() {
        let app = app().await;

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/resume/apply-patch",
                json!({"variantKey": "ai_ml", "patches": {"op": "replace"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].is_string());

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/ai/edit-bullet",
                json!({"variantKey": "ai_ml", "bulletId": 7, "instruction": "shorten"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_validation_error() {
        let app = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/render")
            .body(Body::from("variantKey=ai_ml"))
            .unwrap();

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_save_list_and_fetch_versions() {
        let app = app().await;

        let (status, saved) = send(
            &app.router,
            post_json("/api/resume/save", json!({"variantKey": "ai_ml", "note": "first"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["success"], true);
        let id = saved["versionId"].as_i64().unwrap();

        send(
            &app.router,
            post_json("/api/resume/save", json!({"variantKey": "ai_ml"})),
        )
        .await;

        let (_, list) = send(&app.router, get_req("/api/resume/versions?variantKey=ai_ml")).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0]["id"].as_i64().unwrap() > list[1]["id"].as_i64().unwrap());

        let (status, version) =
            send(&app.router, get_req(&format!("/api/resume/version/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(version["note"], "first");
        assert_eq!(version["resume"]["variantKey"], "ai_ml");

        let (status, _) = send(&app.router, get_req("/api/resume/version/9999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_bullet_unknown_id_is_not_found_without_service_call() {
        let app = app().await;
        let (status, _) = send(
            &app.router,
            post_json(
                "/api/ai/edit-bullet",
                json!({"variantKey": "ai_ml", "bulletId": "zzz", "instruction": "shorten"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_edit_bullet_missing_instruction_is_validation_error() {
        let app = app().await;
        let (status, _) = send(
            &app.router,
            post_json("/api/ai/edit-bullet", json!({"variantKey": "ai_ml", "bulletId": "b-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_edit_section_returns_base_path() {
        let app = app_with(
            StubGenerator::replying(json!({
                "patches": [{"op": "add", "path": "/frameworks/-", "value": "Tokio"}],
                "rationale": "Adds runtime"
            })),
            StubBehaviour::Succeed,
        )
        .await;

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/ai/edit-section",
                json!({"variantKey": "ai_ml", "sectionKey": "skills", "instruction": "add tokio"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basePath"], "/skills");
        assert_eq!(body["rationale"], "Adds runtime");
        assert_eq!(body["warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_ai_failure_is_opaque_bad_gateway() {
        let app = app_with(StubGenerator::empty(), StubBehaviour::Succeed).await;
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/ai/tailor",
                json!({"variantKey": "ai_ml", "jobDescription": "Rust engineer"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["message"], "AI editing failed");
    }

    #[tokio::test]
    async fn test_render_returns_full_source() {
        let app = app().await;
        let (status, body) =
            send(&app.router, post_json("/api/render", json!({"variantKey": "ai_ml"}))).await;
        assert_eq!(status, StatusCode::OK);
        let latex = body["latex"].as_str().unwrap();
        assert!(latex.starts_with("\\documentclass"));
        assert!(latex.contains("\\section{Experience}"));
        assert!(!latex.contains("GENERATED_RESUME_BODY"));
    }

    #[tokio::test]
    async fn test_compile_then_serve_pdf() {
        let app = app().await;

        let (status, first) =
            send(&app.router, post_json("/api/compile", json!({"variantKey": "ai_ml"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["cached"], false);
        let hash = first["hash"].as_str().unwrap().to_string();
        assert_eq!(first["pdfUrl"], format!("/pdfs/{hash}.pdf"));

        let (_, second) =
            send(&app.router, post_json("/api/compile", json!({"variantKey": "ai_ml"}))).await;
        assert_eq!(second["cached"], true);
        assert_eq!(second["hash"], hash);

        let response = app
            .router
            .clone()
            .oneshot(get_req(&format!("/pdfs/{hash}.pdf")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));

        let (status, _) = send(&app.router, get_req("/pdfs/not-a-hash.pdf")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_compile_failure_is_unprocessable_with_logs() {
        let app = app_with(
            StubGenerator::replying(json!({"patches": []})),
            StubBehaviour::FailWithLog("! Undefined control sequence.\nl.7 \\bogus"),
        )
        .await;

        let (status, body) =
            send(&app.router, post_json("/api/compile", json!({"variantKey": "ai_ml"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"],
            json!(["! Undefined control sequence.", "l.7 \\bogus"])
        );
        assert!(body["logs"].as_str().unwrap().contains("Undefined control sequence"));
    }
}
