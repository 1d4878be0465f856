// web-server/src/static_files.rs
//! Serves the chat UI and auth pages as a single-page app.
use actix_web::{web, HttpRequest, HttpResponse, Result, Error};
use actix_files::{Files, NamedFile};
use common::StaticFilesConfig;
use std::path::PathBuf;

#[derive(Clone)]
struct IndexFile(PathBuf);

// Unknown UI routes render the app shell; unknown API routes stay 404
async fn spa_index(req: HttpRequest, index: web::Data<IndexFile>) -> Result<HttpResponse, Error> {
    if req.path().starts_with("/api/") {
        return Ok(HttpResponse::NotFound().finish());
    }

    let file = NamedFile::open(&index.0)?;
    Ok(file.into_response(&req))
}

// Must be registered after every other service: "/" catches all remaining paths
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    let index = IndexFile(PathBuf::from(&config.path).join(&config.index));

    cfg.app_data(web::Data::new(index))
        .service(
            Files::new("/", &config.path)
                .index_file(&config.index)
                .prefer_utf8(true)
                .use_etag(true)
                .use_last_modified(true)
                .default_handler(web::route().to(spa_index))
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, App};
    use actix_web::test::{call_service, init_service, read_body, TestRequest};

    fn site() -> (std::path::PathBuf, StaticFilesConfig) {
        let dir = std::env::temp_dir().join(format!("chat-ui-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<main>chat</main>").unwrap();
        let config = StaticFilesConfig {
            path: dir.to_string_lossy().into_owned(),
            index: "index.html".to_string(),
        };
        (dir, config)
    }

    #[actix_web::test]
    async fn test_unknown_ui_route_serves_index() {
        let (dir, config) = site();
        let app = init_service(App::new().configure(|cfg| configure(cfg, &config))).await;

        let resp = call_service(&app, TestRequest::get().uri("/login").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await, "<main>chat</main>");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[actix_web::test]
    async fn test_unknown_api_route_is_not_found() {
        let (dir, config) = site();
        let app = init_service(App::new().configure(|cfg| configure(cfg, &config))).await;

        let resp = call_service(&app, TestRequest::get().uri("/api/missing").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
