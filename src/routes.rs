use crate::{
    api::{leave_request, out_of_office, public_holiday, schedule},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero rate limiter settings");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
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
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/decline")
                            .route(web::put().to(leave_request::decline_leave)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave)),
                    )
                    .service(
                        web::resource("/{id}/duration")
                            .route(web::get().to(leave_request::leave_duration)),
                    )
                    .service(
                        web::resource("/{id}/next-working-day")
                            .route(web::get().to(leave_request::next_working_day)),
                    ),
            )
            .service(
                web::scope("/members/{member_id}")
                    .service(
                        web::resource("/schedule")
                            .route(web::get().to(schedule::get_schedule))
                            .route(web::put().to(schedule::put_schedule)),
                    )
                    .service(
                        web::resource("/out-of-office")
                            .route(web::get().to(out_of_office::list_settings)),
                    )
                    .service(
                        web::resource("/out-of-office/{leave_type_id}")
                            .route(web::put().to(out_of_office::put_settings))
                            .route(web::patch().to(out_of_office::patch_settings)),
                    )
                    .service(
                        web::resource("/out-of-office/{leave_type_id}/preview")
                            .route(web::post().to(out_of_office::preview_settings)),
                    ),
            )
            .service(
                web::resource("/public-holidays/{id}/days")
                    .route(web::get().to(public_holiday::list_days))
                    .route(web::post().to(public_holiday::create_day)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_extreme_rates() {
        build_limiter(0);
        build_limiter(60);
        build_limiter(u32::MAX);
    }
}
