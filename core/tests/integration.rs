//! Full admin lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the core over real
//! HTTP using ureq: login, listing with filters and paging, create with
//! uploads, edit with image removal, delete, and logout. Validates that the
//! request building and response parsing agree with the actual server.

use estate_core::auth::{complete_auth, login_error_message};
use estate_core::listing::FetchOutcome;
use estate_core::{
    ApiClient, ApiError, AssetUrls, FileUpload, HttpMethod, HttpRequest, HttpResponse,
    ListingController, LoginForm, Preview, PropertyForm, PropertyStatus, PropertyType,
    QueryAction, RequestBody, Session,
};

const BOUNDARY: &str = "estate-integration-boundary";

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Status codes are returned as data so the core decides what a 4xx means.
fn execute(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let url = req.url();

    let result = match req.method {
        HttpMethod::Get | HttpMethod::Delete => {
            let mut builder = if req.method == HttpMethod::Get {
                agent.get(&url)
            } else {
                agent.delete(&url)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post | HttpMethod::Put => {
            let mut builder = if req.method == HttpMethod::Post {
                agent.post(&url)
            } else {
                agent.put(&url)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match &req.body {
                Some(RequestBody::Json(json)) => builder.send(json.as_bytes()),
                Some(RequestBody::Multipart(form)) => builder
                    .content_type(estate_core::MultipartForm::content_type(BOUNDARY))
                    .send(&form.encode(BOUNDARY)[..]),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, mock_server::Store::with_demo_data()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn fetch(listing: &mut ListingController, client: &ApiClient, pending: estate_core::PendingFetch) {
    let outcome = listing.complete(client, pending.seq, execute(pending.request));
    assert!(matches!(outcome, FetchOutcome::Applied), "fetch not applied: {outcome:?}");
}

#[test]
fn admin_lifecycle() {
    let origin = start_server();
    let mut client = ApiClient::new(&format!("{origin}/api"), Session::new());
    let assets = AssetUrls::new(&format!("{origin}/storage"));

    // Step 1: a protected call without a session is refused locally.
    assert!(matches!(client.session().require(), Err(ApiError::Unauthorized(None))));

    // Step 2: wrong password surfaces the server message.
    let req = LoginForm::new("admin@example.com", "wrong-password")
        .build_submit(&client)
        .unwrap();
    let err = complete_auth(&mut client, execute(req)).unwrap_err();
    assert_eq!(login_error_message(&err), "Invalid credentials");
    assert!(!client.session().is_authenticated());

    // Step 3: real login stores the token.
    let req = LoginForm::new("admin@example.com", "secret123")
        .build_submit(&client)
        .unwrap();
    complete_auth(&mut client, execute(req)).unwrap();
    assert!(client.session().is_authenticated());

    // Step 4: mount the listing, then filter and page.
    let mut listing = ListingController::new();
    let pending = listing.mount(&client);
    fetch(&mut listing, &client, pending);
    assert_eq!(listing.page().unwrap().total, 6);
    assert_eq!(listing.rows()[0].title, "Studio near lake");

    let pending = listing.dispatch(&client, QueryAction::SetCity("hanoi".into()));
    fetch(&mut listing, &client, pending);
    assert_eq!(listing.page().unwrap().total, 3);

    let pending = listing.dispatch(&client, QueryAction::SetPerPage(estate_core::PerPage::Five));
    fetch(&mut listing, &client, pending);
    assert!(!listing.can_go_next());

    let pending = listing.dispatch(&client, QueryAction::SetCity(String::new()));
    fetch(&mut listing, &client, pending);
    assert_eq!(listing.last_page(), Some(2));
    let pending = listing.dispatch(&client, QueryAction::NextPage);
    fetch(&mut listing, &client, pending);
    assert_eq!(listing.query().page, 2);
    assert_eq!(listing.rows().len(), 1);
    assert!(!listing.can_go_next());

    // Step 5: a superseded fetch is dropped even when it answers last.
    let first = listing.dispatch(&client, QueryAction::SetPropertyType(Some(PropertyType::Villa)));
    let second = listing.dispatch(&client, QueryAction::SetPropertyType(Some(PropertyType::Land)));
    let second_result = execute(second.request);
    let first_result = execute(first.request);
    assert!(matches!(listing.complete(&client, second.seq, second_result), FetchOutcome::Applied));
    assert!(matches!(listing.complete(&client, first.seq, first_result), FetchOutcome::Stale));
    assert_eq!(listing.rows().len(), 1);
    assert_eq!(listing.rows()[0].title, "Suburban plot");

    // Step 6: create a property with two images.
    let mut form = PropertyForm::create();
    form.fields.title = "Lake house".into();
    form.fields.property_type = Some(PropertyType::House);
    form.fields.status = PropertyStatus::Available;
    form.fields.price = "3200000000".into();
    form.fields.area = "140".into();
    form.fields.address = "2 Lake Rd".into();
    form.fields.city = "Hanoi".into();
    form.fields.district = "Tay Ho".into();
    form.fields.contact_name = "Chi".into();
    form.fields.contact_phone = "0900000002".into();
    form.attach_files([
        FileUpload::new("front.png", "image/png", b"front".to_vec()),
        FileUpload::new("back.png", "image/png", b"back".to_vec()),
    ]);
    let req = form.build_submit(&client).unwrap();
    let created = form.complete_submit(&client, execute(req)).unwrap();
    assert_eq!(created.title, "Lake house");
    assert!(form.new_images().is_empty());

    // Step 7: edit it, dropping the first image and renaming.
    let mut form = PropertyForm::edit(created.id);
    let req = form.build_load(&client).unwrap();
    form.complete_load(&client, execute(req)).unwrap();
    assert_eq!(form.fields.title, "Lake house");
    assert_eq!(form.existing_images().len(), 2);
    match &form.previews(&assets)[0] {
        Preview::Persisted { url: Some(url), .. } => {
            assert!(url.starts_with(&format!("{origin}/storage/properties/")));
        }
        other => panic!("unexpected preview {other:?}"),
    }

    form.remove_preview(0);
    form.fields.title = "Lake house, renovated".into();
    let req = form.build_submit(&client).unwrap();
    let updated = form.complete_submit(&client, execute(req)).unwrap();
    assert_eq!(updated.title, "Lake house, renovated");

    let req = client.build_get_property(created.id);
    let detail = client.parse_get_property(execute(req).unwrap()).unwrap();
    assert_eq!(detail.images.len(), 1);
    assert_eq!(detail.images[0].image_name, "back.png");

    // Step 8: declining the prompt sends nothing; confirming deletes.
    assert!(listing
        .request_delete(&client, created.id, &mut |_: &str| false)
        .is_none());
    let pending = listing
        .request_delete(&client, created.id, &mut |_: &str| true)
        .unwrap();
    let result = execute(pending.request.clone());
    let refresh = listing.complete_delete(&client, pending, result).unwrap();
    fetch(&mut listing, &client, refresh);

    let req = client.build_get_property(created.id);
    let err = client.parse_get_property(execute(req).unwrap()).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 9: an invalid token makes the server answer 401.
    client.set_token("expired");
    let pending = listing.refresh(&client);
    match listing.complete(&client, pending.seq, execute(pending.request)) {
        FetchOutcome::Failed(err) => assert!(err.is_unauthorized()),
        other => panic!("expected 401, got {other:?}"),
    }
    assert!(listing.error().is_some());

    // Step 10: logout.
    client.clear_token();
    assert!(client.session().require().is_err());
}
