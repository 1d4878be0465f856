// web-server/src/api/mod.rs
pub mod auth;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api")
            .configure(crate::relay::configure)
            .service(
                actix_web::web::scope("/auth")
                    .service(auth::login)
                    .service(auth::register)
                    .service(auth::logout)
            )
    );
}
