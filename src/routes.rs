use crate::{
    api::{attendance, leave_request, qr, report, users, wfh},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/history").route(web::get().to(attendance::history))),
            )
            .service(web::scope("/qr").service(web::resource("").route(web::post().to(qr::issue_qr))))
            .service(
                web::scope("/reports")
                    .service(web::resource("/sessions").route(web::get().to(report::sessions)))
                    .service(web::resource("/summary").route(web::get().to(report::summary))),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/wfh")
                    .service(
                        web::resource("")
                            .route(web::get().to(wfh::wfh_list))
                            .route(web::post().to(wfh::create_wfh)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(wfh::approve_wfh)),
                    )
                    .service(web::resource("/{id}/reject").route(web::put().to(wfh::reject_wfh))),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(users::list_users)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(users::approve_user)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(users::reject_user)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (24 h identity token)
//  └─ refresh_token (7 days, revocable)

// CHECK-IN
//  └─ POST /attendance/check-in with method + QR token / badge tag
//       └─ reconciler admits and assigns session_id
