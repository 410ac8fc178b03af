#[cfg(test)]
mod tests {
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::cookie::Key;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use rupress::middleware::ClientCtx;

    fn init() {
        rupress::global::init();
        rupress::filesystem::init();
    }

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(ClientCtx::default())
                    .wrap(SessionMiddleware::new(
                        CookieSessionStore::default(),
                        Key::generate(),
                    ))
                    .configure(rupress::web::configure),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_login_page_renders() {
        init();
        let app = test_app!();
        let req = test::TestRequest::default().uri("/auth/login/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_rt::test]
    async fn test_signup_page_renders() {
        init();
        let app = test_app!();
        let req = test::TestRequest::default()
            .uri("/auth/signup/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_rt::test]
    async fn test_anonymous_create_redirects_to_login() {
        init();
        let app = test_app!();

        for req in [
            test::TestRequest::get().uri("/create/").to_request(),
            test::TestRequest::post().uri("/create/").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(
                resp.headers().get(header::LOCATION).unwrap(),
                "/auth/login/?next=/create/"
            );
        }
    }

    #[actix_rt::test]
    async fn test_anonymous_edit_redirects_to_login() {
        init();
        let app = test_app!();
        let req = test::TestRequest::get().uri("/posts/1/edit/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/posts/1/edit/"
        );
    }

    #[actix_rt::test]
    async fn test_anonymous_comment_redirects_to_login() {
        init();
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/posts/1/comment/")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/posts/1/comment/"
        );
    }

    #[actix_rt::test]
    async fn test_anonymous_follow_routes_redirect_to_login() {
        init();
        let app = test_app!();

        let cases = [
            ("/follow/", "/auth/login/?next=/follow/"),
            (
                "/profile/someone/follow/",
                "/auth/login/?next=/profile/someone/follow/",
            ),
            (
                "/profile/someone/unfollow/",
                "/auth/login/?next=/profile/someone/unfollow/",
            ),
        ];
        for (uri, expected) in cases {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), expected);
        }
    }
}
