use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use super::*;

fn client(server: &ServerGuard) -> TestResult<ZenodoClient> {
  Ok(ZenodoClient::with_base_url("secret", &format!("{}/api", server.url()), &server.url())?)
}

fn token() -> Matcher { Matcher::UrlEncoded("access_token".into(), "secret".into()) }

#[tokio::test]
async fn test_proceedings_deposit_run() -> TestResult<()> {
  let (_dir, project) = create_proceedings()?;
  let mut server = Server::new_async().await;
  let bucket = format!("{}/api/files/bucket-100", server.url());

  let create = server
    .mock("POST", "/api/deposit/depositions")
    .match_query(token())
    .match_body(Matcher::PartialJson(json!({
      "metadata": {
        "upload_type": "presentation",
        "title": "First Talk",
        "description": "<p>All about First Talk.</p>",
        "creators": [{ "name": "Doe, Jane" }],
        "license": "cc-by-4.0",
        "conference_title": "Proceedings of X",
        "conference_acronym": "PX",
        "imprint_publisher": "PX"
      }
    })))
    .with_status(201)
    .with_body(json!({ "id": 100, "state": "unsubmitted" }).to_string())
    .expect(1)
    .create_async()
    .await;
  let update = server
    .mock("PUT", "/api/deposit/depositions/100")
    .match_query(token())
    .match_body(Matcher::PartialJson(json!({ "metadata": { "title": "Second Talk" } })))
    .with_status(200)
    .with_body(json!({ "id": 100 }).to_string())
    .expect(1)
    .create_async()
    .await;
  let lookup = server
    .mock("GET", "/api/deposit/depositions/100")
    .match_query(token())
    .with_status(200)
    .with_body(json!({ "id": 100, "links": { "bucket": bucket } }).to_string())
    .expect(2)
    .create_async()
    .await;
  let first_upload = server
    .mock("PUT", "/api/files/bucket-100/b-first.pdf")
    .match_query(token())
    .match_body("%PDF First Talk")
    .with_status(201)
    .with_body(json!({ "key": "b-first.pdf", "size": 15 }).to_string())
    .expect(1)
    .create_async()
    .await;
  let second_upload = server
    .mock("PUT", "/api/files/bucket-100/a-second.pdf")
    .match_query(token())
    .with_status(201)
    .with_body(json!({ "key": "a-second.pdf", "size": 16 }).to_string())
    .expect(1)
    .create_async()
    .await;

  let articles = collect_articles(&project)?;
  let depositor = Depositor::new(client(&server)?, UploadType::Presentation);
  let outcomes = depositor.run(articles).await?;

  create.assert_async().await;
  update.assert_async().await;
  lookup.assert_async().await;
  first_upload.assert_async().await;
  second_upload.assert_async().await;

  let titles: Vec<&str> = outcomes.iter().map(|outcome| outcome.title.as_str()).collect();
  assert_eq!(titles, ["First Talk", "Second Talk"]);
  assert!(outcomes[0].created);
  assert!(!outcomes[1].created);
  assert_eq!(outcomes[1].files[0].key, "a-second.pdf");

  let config = fs::read_to_string(project.join("project.yml"))?;
  let binding = format!("project:\n  zenodo: {}/deposit/100\n", server.url());
  assert_eq!(config, PROJECT_CONFIG.replacen("project:\n", &binding, 1));
  Ok(())
}

#[tokio::test]
async fn test_rejected_create_leaves_no_binding() -> TestResult<()> {
  let (_dir, project) = create_proceedings()?;
  let mut server = Server::new_async().await;
  server
    .mock("POST", "/api/deposit/depositions")
    .match_query(token())
    .with_status(403)
    .with_body(r#"{"message": "Permission denied."}"#)
    .create_async()
    .await;

  let depositor = Depositor::new(client(&server)?, UploadType::Presentation);
  let result = depositor.run(collect_articles(&project)?).await;

  assert!(matches!(result, Err(DepositorError::Api { status: 403, .. })));
  assert_eq!(fs::read_to_string(project.join("project.yml"))?, PROJECT_CONFIG);
  assert_eq!(depositor.archive().deposit_url(3), format!("{}/deposit/3", server.url()));
  Ok(())
}

#[tokio::test]
async fn test_missing_abstract_fails_before_network() -> TestResult<()> {
  let (_dir, project) = create_proceedings()?;
  fs::write(
    project.join("talks/b-first.md"),
    "---\ntitle: First Talk\nfirst_page: 1\n---\nNo abstract.\n",
  )?;
  let mut server = Server::new_async().await;
  let create = server.mock("POST", Matcher::Any).expect(0).create_async().await;

  let depositor = Depositor::new(client(&server)?, UploadType::Presentation);
  let result = depositor.run(collect_articles(&project)?).await;

  assert!(matches!(result, Err(DepositorError::MissingField { field: "abstract", .. })));
  create.assert_async().await;
  Ok(())
}
