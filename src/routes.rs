use crate::{
    api::{attendance, leave_request, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

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

    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // All routes require a bearer token minted by the external auth
    // service; role checks happen per handler.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::list_payroll)))
                    // /payroll/generate
                    .service(
                        web::resource("/generate")
                            .route(web::post().to(payroll::generate_payroll)),
                    )
                    // /payroll/employee/{employee_id}
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(payroll::employee_payroll)),
                    )
                    // /payroll/payslip/{employee_id}/{month}/{year}
                    .service(
                        web::resource("/payslip/{employee_id}/{month}/{year}")
                            .route(web::get().to(payroll::payslip)),
                    )
                    // /payroll/employee-salary
                    .service(
                        web::resource("/employee-salary")
                            .route(web::post().to(payroll::upsert_salary)),
                    )
                    // /payroll/employee-salary/{employee_id}
                    .service(
                        web::resource("/employee-salary/{employee_id}")
                            .route(web::get().to(payroll::get_salary)),
                    )
                    // /payroll/advance-payment
                    .service(
                        web::resource("/advance-payment")
                            .route(web::post().to(payroll::create_advance)),
                    )
                    // /payroll/advance-payments
                    .service(
                        web::resource("/advance-payments")
                            .route(web::get().to(payroll::list_advances)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/check-out
                    .service(
                        web::resource("/check-out").route(web::put().to(attendance::check_out)),
                    ),
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
            ),
    );
}
