mod health;
mod monitors;
mod ping;

macros_utils::routes! {
    module health,
    module ping,
    module monitors,
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use pulse_service::Orchestrator;
    use pulse_service::config::Config;
    use pulse_service::database::Database;
    use pulse_service::database::models::{CronConfig, HttpProbeConfig, Monitor, MonitorConfig};
    use pulse_service::pool::open_pool;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::routes;

    async fn orchestrator() -> (TempDir, Orchestrator) {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = open_pool(temp_dir.path().join("server.db"), 2).await.unwrap();
        let orchestrator = Orchestrator::new(Config::default(), pool).await.unwrap();
        (temp_dir, orchestrator)
    }

    macro_rules! app {
        ($orchestrator:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::from($orchestrator.processor()))
                    .app_data(web::Data::from($orchestrator.scheduler()))
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let (_dir, orchestrator) = orchestrator().await;
        let app = app!(orchestrator);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn ping_records_heartbeat() {
        let (_dir, orchestrator) = orchestrator().await;
        let monitor = Monitor::new(Uuid::new_v4(), "nightly backup", MonitorConfig::Cron(CronConfig::default()));
        orchestrator.database().save_monitor(&monitor).await.unwrap();
        let app = app!(orchestrator);

        let req = test::TestRequest::get().uri(&format!("/ping/{}", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["message"], "Ping received");
        assert!(body["timestamp"].is_string());

        let stored = orchestrator.database().get_monitor(monitor.id).await.unwrap().unwrap();
        assert!(stored.last_ping_at.is_some());
    }

    #[actix_web::test]
    async fn ping_on_paused_monitor_is_ignored() {
        let (_dir, orchestrator) = orchestrator().await;
        let mut monitor = Monitor::new(Uuid::new_v4(), "paused job", MonitorConfig::Cron(CronConfig::default()));
        monitor.is_paused = true;
        orchestrator.database().save_monitor(&monitor).await.unwrap();
        let app = app!(orchestrator);

        let req = test::TestRequest::get().uri(&format!("/ping/{}", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["message"], "Monitor is paused, ping ignored");
        let stored = orchestrator.database().get_monitor(monitor.id).await.unwrap().unwrap();
        assert!(stored.last_ping_at.is_none());
    }

    #[actix_web::test]
    async fn ping_rejects_unknown_and_non_cron_monitors() {
        let (_dir, orchestrator) = orchestrator().await;
        let http = website();
        orchestrator.database().save_monitor(&http).await.unwrap();
        let app = app!(orchestrator);

        let cases = [
            (format!("/ping/{}", Uuid::new_v4()), "Monitor not found"),
            ("/ping/not-a-uuid".to_string(), "Monitor not found"),
            (format!("/ping/{}", http.id), "Monitor is not a cron type"),
        ];

        for (uri, message) in cases {
            let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["statusCode"], 404);
            assert_eq!(body["message"], message);
        }
    }

    #[actix_web::test]
    async fn test_probe_reports_failures_in_body() {
        let (_dir, orchestrator) = orchestrator().await;
        let app = app!(orchestrator);

        let req = test::TestRequest::post()
            .uri("/monitors/test")
            .set_json(json!({ "url": "https://example.com", "type": "cron" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("only supported for HTTP"));
        assert!(body.get("responseTime").is_none());

        let req = test::TestRequest::post()
            .uri("/monitors/test")
            .set_json(json!({ "url": "not a url", "type": "http" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    fn website() -> Monitor {
        Monitor::new(Uuid::new_v4(), "website", MonitorConfig::Http(HttpProbeConfig::new("https://example.com")))
    }

    #[actix_web::test]
    async fn pause_and_resume_toggle_schedule() {
        let (_dir, orchestrator) = orchestrator().await;
        let monitor = website();
        orchestrator.database().save_monitor(&monitor).await.unwrap();
        orchestrator.scheduler().schedule_monitor(&monitor).await.unwrap();
        let app = app!(orchestrator);

        let req = test::TestRequest::post().uri(&format!("/monitors/{}/pause", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["isPaused"], true);
        assert!(orchestrator.database().get_monitor(monitor.id).await.unwrap().unwrap().is_paused);
        assert!(orchestrator.queue().is_empty());

        let req = test::TestRequest::post().uri(&format!("/monitors/{}/resume", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["isPaused"], false);
        assert_eq!(body["scheduled"], true);
        assert!(!orchestrator.database().get_monitor(monitor.id).await.unwrap().unwrap().is_paused);
        assert_eq!(orchestrator.queue().len(), 1);
    }

    #[actix_web::test]
    async fn resume_rejects_invalid_monitor_and_keeps_it_paused() {
        let (_dir, orchestrator) = orchestrator().await;
        let mut monitor = website();
        monitor.is_paused = true;
        monitor.interval_minutes = Some(5_000);
        orchestrator.database().save_monitor(&monitor).await.unwrap();
        let app = app!(orchestrator);

        let req = test::TestRequest::post().uri(&format!("/monitors/{}/resume", monitor.id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(orchestrator.database().get_monitor(monitor.id).await.unwrap().unwrap().is_paused);
    }

    #[actix_web::test]
    async fn delete_removes_monitor() {
        let (_dir, orchestrator) = orchestrator().await;
        let monitor = website();
        orchestrator.database().save_monitor(&monitor).await.unwrap();
        orchestrator.scheduler().schedule_monitor(&monitor).await.unwrap();
        let app = app!(orchestrator);

        let req = test::TestRequest::delete().uri(&format!("/monitors/{}", monitor.id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(orchestrator.database().get_monitor(monitor.id).await.unwrap().is_none());
        assert!(orchestrator.queue().is_empty());

        let req = test::TestRequest::delete().uri(&format!("/monitors/{}", monitor.id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn lifecycle_routes_return_404_for_unknown_ids() {
        let (_dir, orchestrator) = orchestrator().await;
        let app = app!(orchestrator);
        let unknown = Uuid::new_v4();

        let requests = [
            test::TestRequest::post().uri(&format!("/monitors/{unknown}/pause")),
            test::TestRequest::post().uri(&format!("/monitors/{unknown}/resume")),
            test::TestRequest::delete().uri(&format!("/monitors/{unknown}")),
            test::TestRequest::post().uri("/monitors/not-a-uuid/pause"),
        ];

        for req in requests {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Monitor not found");
        }
    }
}
