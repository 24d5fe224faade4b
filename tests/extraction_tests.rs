use match_schedule_scraper::{
    extract_channel_from_text, extract_matches, load_matches, normalize_channel_name,
    process_html, scrape, DateMode, Match, ScrapeConfig, ScrapeError, KNOWN_CHANNELS, UNSPECIFIED,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TODAY: &str = "15/03/2025";

fn config_in(dir: &tempfile::TempDir) -> ScrapeConfig {
    ScrapeConfig {
        url: "http://127.0.0.1:9/".to_string(),
        output: dir.path().join("matches-today.json"),
        today: TODAY.to_string(),
        ..ScrapeConfig::default()
    }
}

#[test]
fn test_end_to_end_permissive_page() {
    let html = r#"<table><tr><td>18:00</td><td><a href="/equipo/a">Club A</a></td><td><a href="/equipo/b">Club B</a></td><td><a href="/canal/espn">ESPN</a></td></tr></table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Permissive);
    assert_eq!(
        extraction.matches,
        vec![Match {
            time: "18:00".to_string(),
            competition: UNSPECIFIED.to_string(),
            home_team: "Club A".to_string(),
            away_team: "Club B".to_string(),
            channels: vec!["ESPN".to_string()],
        }]
    );
    assert_eq!(extraction.stats.rows_scanned, 1);
    assert_eq!(extraction.stats.matches_accepted, 1);
}

#[test]
fn test_end_to_end_json_shape() {
    let html = r#"<table><tr><td>18:00</td><td><a href="/equipo/a">Club A</a></td><td><a href="/equipo/b">Club B</a></td><td><a href="/canal/espn">ESPN</a></td></tr></table>"#;
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    process_html(html, &config).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.output).unwrap()).unwrap();
    assert_eq!(
        written,
        serde_json::json!([{
            "time": "18:00",
            "competition": "unspecified",
            "homeTeam": "Club A",
            "awayTeam": "Club B",
            "channels": ["ESPN"]
        }])
    );
}

#[test]
fn test_strict_mode_keeps_only_today() {
    let html = r#"
        <table>
            <tr><th colspan="4">Partidos del 15/03/2025</th></tr>
            <tr>
                <td>18:00</td>
                <td><a href="/equipo/a">Club A</a></td>
                <td><a href="/equipo/b">Club B</a></td>
                <td>15/03/2025</td>
            </tr>
            <tr>
                <td>20:00</td>
                <td><a href="/equipo/c">Club C</a></td>
                <td><a href="/equipo/d">Club D</a></td>
                <td>16/03/2025</td>
            </tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Strict);
    assert_eq!(extraction.matches.len(), 1);
    assert_eq!(extraction.matches[0].home_team, "Club A");
    assert_eq!(extraction.matches[0].away_team, "Club B");
}

#[test]
fn test_strict_mode_ignores_tables_for_other_days() {
    let html = r#"
        <h3>Hoy 15/03/2025</h3>
        <table>
            <tr><td>15/03/2025</td></tr>
            <tr><td>19:00</td> <td>Real Madrid vs Barcelona</td></tr>
        </table>
        <h3>Mañana 16/03/2025</h3>
        <table>
            <tr><td>21:00</td> <td>Sevilla vs Betis</td></tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Strict);
    assert_eq!(extraction.matches.len(), 1);
    assert_eq!(extraction.matches[0].home_team, "Real Madrid");
}

#[test]
fn test_strict_mode_stops_at_next_day_header_row() {
    let html = r#"
        <table>
            <tr><th>15/03/2025</th></tr>
            <tr><td>18:00</td> <td>Real Madrid vs Barcelona</td></tr>
            <tr><th>16/03/2025</th></tr>
            <tr><td>20:00</td> <td>Sevilla vs Betis</td></tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Strict);
    assert_eq!(extraction.matches.len(), 1);
    assert_eq!(extraction.matches[0].time, "18:00");
    assert_eq!(extraction.matches[0].home_team, "Real Madrid");
    assert_eq!(extraction.stats.matches_accepted, 1);
}

#[test]
fn test_strict_mode_caption_opens_today() {
    let html = r#"
        <table>
            <caption>Hoy 15/03/2025</caption>
            <tr><td>18:00</td> <td>Real Madrid vs Barcelona</td></tr>
            <tr><td>20:00</td> <td>Sevilla vs Betis</td></tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Strict);
    assert_eq!(extraction.matches.len(), 2);
}

#[test]
fn test_permissive_mode_keeps_undated_rows() {
    let html = r#"
        <table>
            <tr>
                <td>20:30</td>
                <td>Real Madrid vs Barcelona</td>
                <td><img src="/logos/dazn.png" alt="DAZN"></td>
            </tr>
            <tr>
                <td>22:00</td>
                <td>Sevilla vs Betis</td>
                <td>14/03/2025</td>
            </tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.mode, DateMode::Permissive);
    assert_eq!(extraction.matches.len(), 1);
    let found = &extraction.matches[0];
    assert_eq!(found.time, "20:30");
    assert_eq!(found.home_team, "Real Madrid");
    assert_eq!(found.away_team, "Barcelona");
    assert_eq!(found.channels, vec!["DAZN"]);
}

#[test]
fn test_competition_carries_over_rows() {
    let html = r#"
        <table>
            <tr><td colspan="4"><a href="/competicion/liga-mx">Liga MX</a></td></tr>
            <tr>
                <td>19:00</td>
                <td><a href="/equipo/america">América</a></td>
                <td><a href="/equipo/toluca">Toluca</a></td>
                <td>TUDN</td>
            </tr>
            <tr>
                <td>21:05</td>
                <td><a href="/equipo/tigres">Tigres</a></td>
                <td><a href="/equipo/pumas">Pumas</a></td>
                <td>Caliente TV</td>
            </tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.matches.len(), 2);
    assert!(extraction.matches.iter().all(|m| m.competition == "Liga MX"));
    assert_eq!(extraction.matches[0].channels, vec!["TUDN"]);
    assert_eq!(extraction.stats.rows_scanned, 3);
}

#[test]
fn test_rows_without_time_or_teams_yield_nothing() {
    let html = r#"
        <table>
            <tr><td>Club A vs Club B</td><td>ESPN</td></tr>
            <tr><td>18:00</td><td>por confirmar</td></tr>
            <tr><td>Publicidad</td></tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert!(extraction.matches.is_empty());
    assert_eq!(extraction.stats.rows_scanned, 3);
    assert_eq!(extraction.stats.rows_with_time, 1);
    assert_eq!(extraction.stats.matches_accepted, 0);
}

#[test]
fn test_accepted_matches_are_never_blank() {
    let html = r#"
        <table>
            <tr><td>18:00</td><td><a href="/equipo/a">Club A</a></td><td><a href="/equipo/b">Club B</a></td></tr>
            <tr><td>19:00</td><td><a href="/equipo/c"> </a></td><td><a href="/equipo/d">Club D</a></td></tr>
            <tr><td>20:00</td> <td>Pachuca - Monterrey</td> <td><span>ESPN 2</span> <span>Disney Plus</span></td></tr>
        </table>"#;

    let extraction = extract_matches(html, TODAY);

    assert_eq!(extraction.matches.len(), 2);
    for m in &extraction.matches {
        assert!(!m.home_team.is_empty());
        assert!(!m.away_team.is_empty());
        assert!(!m.channels.is_empty());
    }
    assert_eq!(extraction.matches[0].channels, vec![UNSPECIFIED]);
    assert!(extraction.matches[1].channels.contains(&"Disney+".to_string()));
}

#[test]
fn test_longest_channel_wins() {
    assert_eq!(extract_channel_from_text("ESPN | ESPN Deportes"), Some("ESPN Deportes"));
    assert_eq!(extract_channel_from_text("MLS Season Pass (Apple TV)"), Some("MLS Season Pass (Apple TV)"));
}

#[test]
fn test_normalization_is_idempotent() {
    for channel in KNOWN_CHANNELS {
        let once = normalize_channel_name(channel);
        assert_eq!(normalize_channel_name(&once), once);
    }
}

#[test]
fn test_empty_page_writes_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    let report = process_html("<html><body><p>Cargando...</p></body></html>", &config).unwrap();

    assert!(report.matches.is_empty());
    assert_eq!(std::fs::read_to_string(&config.output).unwrap(), "[]");
    assert!(load_matches(&config.output).is_empty());
}

#[test]
fn test_load_tolerates_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matches-today.json");
    assert!(load_matches(&path).is_empty());

    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_matches(&path).is_empty());
}

/// Serves one canned HTTP response on a local port
async fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn test_error_status_is_an_http_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig {
        url: serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await,
        ..config_in(&dir)
    };

    let err = scrape(&config).await.unwrap_err();

    assert_eq!(err.kind(), "http");
    assert!(matches!(err, ScrapeError::Http { status: 503, .. }), "{err}");
    assert!(!config.output.exists());
}

#[tokio::test]
async fn test_refused_connection_is_a_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig {
        url: format!("http://{addr}/"),
        ..config_in(&dir)
    };

    let err = scrape(&config).await.unwrap_err();

    assert_eq!(err.kind(), "network", "{err}");
    assert!(!config.output.exists());
}

#[tokio::test]
async fn test_successful_fetch_writes_matches() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig {
        url: serve_once(concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n",
            "<table><tr><td>18:00</td> <td>Real Madrid vs Barcelona</td> <td>DAZN</td></tr></table>"
        ))
        .await,
        ..config_in(&dir)
    };

    let report = scrape(&config).await.unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(load_matches(&config.output), report.matches);
}
