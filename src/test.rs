use std::{io::Write, net::TcpListener, path::Path, time::Duration};

use anyhow::Result;
use mockito::{Matcher, Server, ServerGuard};

use crate::{
    config::{FileConfig, RelayConfig},
    error::SubmitError,
    form::{parse_pair, SelectedFile, Submission},
    handler::FormHandler,
    io::{download_path, save_download},
    objects::ObjectUrls,
    status::{DownloadLink, MemoryStatus, Status, PROCESSING},
};

fn handler_for(server: &ServerGuard) -> Result<FormHandler<MemoryStatus>> {
    let config = RelayConfig::default().server(server.url());
    FormHandler::from_config(&config, MemoryStatus::new())
}

fn slow_body(
    delay: Duration,
) -> impl Fn(&mut dyn Write) -> std::io::Result<()> + Send + Sync + 'static {
    move |writer: &mut dyn Write| {
        std::thread::sleep(delay);
        writer.write_all(b"processed")
    }
}

fn report_submission() -> Submission {
    Submission::new()
        .text("note", "quarterly")
        .file("excel", SelectedFile::new("report.xlsx", "spreadsheet"))
        .file("pdfs[]", SelectedFile::new("a.pdf", "pdf one"))
        .file("pdfs[]", SelectedFile::new("b.pdf", "pdf two"))
}

#[tokio::test]
async fn success_shows_download_link() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/process")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="excel"; filename="report.xlsx""#.to_owned()),
            Matcher::Regex(r#"name="pdfs\[\]"; filename="b.pdf""#.to_owned()),
            Matcher::Regex("quarterly".to_owned()),
        ]))
        .with_status(200)
        .with_body(b"\x50\x4b\x03\x04processed")
        .expect(1)
        .create_async()
        .await;
    let handler = handler_for(&server)?;

    let link = handler.submit(report_submission()).await?;

    mock.assert_async().await;
    assert_eq!(link.download, "report.xlsx");
    assert_eq!(link.label, "Download report.xlsx");
    assert_eq!(
        handler.objects().resolve(&link.href).as_deref(),
        Some(&b"\x50\x4b\x03\x04processed"[..])
    );
    assert_eq!(
        handler.status().history(),
        vec![Status::Text(PROCESSING.to_owned()), Status::Link(link)]
    );
    Ok(())
}

#[tokio::test]
async fn server_error_shows_body() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/process")
        .with_status(400)
        .with_body("Invalid spreadsheet")
        .create_async()
        .await;
    let handler = handler_for(&server)?;

    let err = handler.submit(report_submission()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Server(ref body) if body == "Invalid spreadsheet"));
    assert_eq!(
        handler.status().current(),
        Some(Status::Text("Error: Invalid spreadsheet".to_owned()))
    );
    assert!(handler.objects().is_empty());
    Ok(())
}

#[tokio::test]
async fn success_without_file_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/process")
        .with_status(200)
        .with_body("processed")
        .create_async()
        .await;
    let handler = handler_for(&server)?;
    let submission = Submission::new()
        .text("excel", "not a file")
        .file("pdfs[]", SelectedFile::new("a.pdf", "pdf"));

    let err = handler.submit(submission).await.unwrap_err();

    assert!(matches!(err, SubmitError::NoFileSelected));
    assert_eq!(
        handler.status().history(),
        vec![
            Status::Text(PROCESSING.to_owned()),
            Status::Text("Error: No file selected.".to_owned()),
        ]
    );
    // The handle exists before the file check and is never revoked.
    assert_eq!(handler.objects().len(), 1);
    Ok(())
}

#[tokio::test]
async fn connection_refused_shows_message() -> Result<()> {
    let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let config = RelayConfig::default()
        .server(format!("http://127.0.0.1:{port}"))
        .connection_timeout(Duration::from_secs(2));
    let handler = FormHandler::from_config(&config, MemoryStatus::new())?;

    let err = handler.submit(report_submission()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Unexpected(_)));
    let shown = handler.status().current().expect("status written");
    assert_eq!(shown, Status::Text(format!("Error: {err}")));
    assert!(shown.text().starts_with("Error: "));
    assert_eq!(handler.status().history().len(), 2);
    Ok(())
}

#[tokio::test]
async fn processing_shown_while_waiting() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/process")
        .with_status(200)
        .with_chunked_body(slow_body(Duration::from_millis(500)))
        .create_async()
        .await;
    let handler = handler_for(&server)?;

    let (outcome, waiting) = tokio::join!(handler.submit(report_submission()), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handler.status().current()
    });

    assert_eq!(waiting, Some(Status::Text(PROCESSING.to_owned())));
    assert_eq!(outcome?.label, "Download report.xlsx");
    Ok(())
}

#[tokio::test]
async fn stale_response_leaves_status_alone() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/process")
        .with_status(200)
        .with_chunked_body(slow_body(Duration::from_millis(200)))
        .create_async()
        .await;
    let handler = handler_for(&server)?;

    let (outcome, newer) = tokio::join!(handler.submit(report_submission()), async {
        handler.begin()
    });

    assert_eq!(newer, 2);
    assert_eq!(outcome?.download, "report.xlsx");
    assert_eq!(
        handler.status().history(),
        vec![Status::Text(PROCESSING.to_owned())]
    );
    Ok(())
}

#[test]
fn tickets_are_monotonic() -> Result<()> {
    let config = RelayConfig::default();
    let handler = FormHandler::from_config(&config, MemoryStatus::new())?;
    let first = handler.begin();
    assert!(handler.is_current(first));
    let second = handler.begin();
    assert!(second > first);
    assert!(!handler.is_current(first));
    assert!(handler.is_current(second));
    Ok(())
}

#[test]
fn first_file_of_field() {
    let submission = report_submission();
    assert_eq!(submission.files("pdfs[]").len(), 2);
    assert_eq!(
        submission.first_file("pdfs[]").map(|file| file.name.as_str()),
        Some("a.pdf")
    );
    assert!(submission.files("missing").is_empty());
    assert!(submission.first_file("note").is_none());
}

#[test]
fn pairs() -> Result<()> {
    assert_eq!(
        parse_pair("excel=dir/a=b.xlsx")?,
        ("excel".to_owned(), "dir/a=b.xlsx".to_owned())
    );
    assert_eq!(parse_pair("empty=")?, ("empty".to_owned(), String::new()));
    assert!(parse_pair("no-separator").is_err());
    assert!(parse_pair("=value").is_err());
    Ok(())
}

#[test]
fn config_file_overrides_defaults() -> Result<()> {
    let file = FileConfig::parse(
        r#"
server = "http://qa.local:8080"
file-field = "workbook"
connection-timeout = 1500
"#,
    )?;
    let config = RelayConfig::default().merge(file);
    assert_eq!(config.file_field, "workbook");
    assert_eq!(config.output_dir, ".");
    assert_eq!(config.connection_timeout, Some(Duration::from_millis(1500)));
    assert_eq!(
        config.endpoint_url()?.as_str(),
        "http://qa.local:8080/api/process"
    );
    assert!(FileConfig::parse("server = 5").is_err());
    Ok(())
}

#[test]
fn download_path_stays_in_dir() -> Result<()> {
    let dir = Path::new("out");
    assert_eq!(download_path(dir, "report.xlsx")?, dir.join("report.xlsx"));
    assert_eq!(download_path(dir, "../../etc/report.xlsx")?, dir.join("report.xlsx"));
    assert!(download_path(dir, "..").is_err());
    Ok(())
}

#[tokio::test]
async fn save_download_writes_and_revokes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let objects = ObjectUrls::new();
    let href = objects.create("processed".into());
    let link = DownloadLink::new(href.clone(), "report.xlsx".to_owned());

    let path = save_download(&objects, &link, dir.path().join("nested")).await?;

    assert_eq!(std::fs::read(&path)?, b"processed");
    assert!(objects.resolve(&href).is_none());
    assert!(save_download(&objects, &link, dir.path()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn selected_file_loads_name_and_content() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("template.xlsx");
    std::fs::write(&path, b"excel")?;
    let file = SelectedFile::load(&path).await?;
    assert_eq!(file, SelectedFile::new("template.xlsx", &b"excel"[..]));
    Ok(())
}
