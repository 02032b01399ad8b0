// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestrator scenarios against the scripted renderer.
//!
//! Covers the strategy chain end to end: readiness, selection, sanitizing,
//! fallback across strategies, crash recovery and the direct probe.

mod common;

use common::*;
use normas_runtime::acquisition::{
    Acquisition, AcquisitionOrchestrator, HttpClient, Portal, Strategy,
};
use normas_runtime::config::Config;
use normas_runtime::error::{AcquireError, ErrorKind};
use normas_runtime::renderer::scripted::{PageScript, ScriptedRenderer, SessionEvent};
use normas_runtime::renderer::RenderMode;
use normas_runtime::store::naming::artifact_stem;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn orchestrator(renderer: &ScriptedRenderer, config: &Config) -> AcquisitionOrchestrator {
    AcquisitionOrchestrator::new(
        Arc::new(renderer.clone()),
        HttpClient::new(Duration::from_secs(5)),
        config,
    )
}

fn text_reads_before_second_session(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .skip(1)
        .take_while(|e| !matches!(e, SessionEvent::Opened(_)))
        .filter(|e| matches!(e, SessionEvent::TextRead))
        .count()
}

// ── Scenario A: registry URL renders after a few polls ──

#[tokio::test]
async fn test_registry_url_ready_after_three_polls() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new().page(&url, document_page(2));
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::RegistryUrl);
    assert_eq!(result.origin_url, url);
    assert!(!result.degraded);
    assert!(result.text.starts_with("RESOLUÇÃO CMN Nº 4.734\n\nArt. 1º"));
    assert!(!result.text.contains("\n\n\n"));
    assert!(!result.text.contains("  "));

    let events = renderer.events();
    let reads = events.iter().filter(|e| matches!(e, SessionEvent::TextRead)).count();
    assert_eq!(reads, 3);
    assert_eq!(renderer.sessions_opened(), 1);
    assert_eq!(events.last(), Some(&SessionEvent::Closed));
}

// ── Scenario B: readiness times out, alternate mode renders ──

#[tokio::test]
async fn test_timeout_advances_to_alternate_mode() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new()
        .page_in_mode(&url, RenderMode::Headless, stuck_page())
        .page_in_mode(&url, RenderMode::Visible, document_page(0));
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::AlternateRender);
    let events = renderer.events();
    assert_eq!(events[0], SessionEvent::Opened(RenderMode::Headless));
    assert_eq!(text_reads_before_second_session(&events), 25);
    assert!(events.contains(&SessionEvent::Opened(RenderMode::Visible)));
    // search form never reached
    assert!(!renderer.navigations().iter().any(|u| u.contains("buscanormas")));
}

// ── Strategy short-circuit ──

#[tokio::test]
async fn test_success_never_starts_later_strategies() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new().page(&url, document_page(0));
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    orch.acquire(&record).await.unwrap();

    assert_eq!(renderer.navigations(), vec![url]);
    assert!(!renderer.events().contains(&SessionEvent::Opened(RenderMode::Visible)));
}

#[tokio::test]
async fn test_direct_probe_hit_needs_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/estabilidadefinanceira/normativo/pdf/Circular_3.978.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        probe_direct: true,
        portal_base: server.uri(),
        ..fast_config(dir.path())
    };
    let renderer = ScriptedRenderer::new();
    let mut orch = orchestrator(&renderer, &config);
    let mut record = record("Circular", "3.978", "prevenção à lavagem");
    record.source_url = None;

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    let pdf = format!("{}/estabilidadefinanceira/normativo/pdf/Circular_3.978.pdf", server.uri());
    assert_eq!(result.strategy_used, Strategy::DirectProbe);
    assert_eq!(result.sidecar_links, vec![pdf.clone()]);
    assert!(result.text.contains(&pdf));
    assert_eq!(renderer.sessions_opened(), 0);
}

// ── Session crashes ──

#[tokio::test]
async fn test_crash_rebuilds_and_retries_same_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new()
        .page(&url, document_page(0))
        .crash_on(&url, 1);
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::RegistryUrl);
    assert_eq!(renderer.sessions_opened(), 2);
    let events = renderer.events();
    assert_eq!(events[0], SessionEvent::Opened(RenderMode::Headless));
    assert_eq!(events[2], SessionEvent::Closed);
    assert_eq!(events[3], SessionEvent::Opened(RenderMode::Headless));
}

#[tokio::test]
async fn test_second_crash_fails_the_strategy_only() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new()
        .page(&url, document_page(0))
        .crash_on(&url, 2);
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::AlternateRender);
    assert_eq!(renderer.sessions_opened(), 3);
}

// ── Total failure and fatal backend ──

#[tokio::test]
async fn test_all_strategies_fail() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new().page(&url, stuck_page());
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Failed(failures) = orch.acquire(&record).await.unwrap() else {
        panic!("expected failure");
    };

    let tried: Vec<_> = failures.iter().map(|f| f.strategy).collect();
    assert_eq!(
        tried,
        vec![Strategy::RegistryUrl, Strategy::AlternateRender, Strategy::SearchForm]
    );
    assert_eq!(failures[0].kind, ErrorKind::ContentNotFound);
    // search page is not served
    assert_eq!(failures[2].kind, ErrorKind::Navigation);
    assert_eq!(renderer.events().last(), Some(&SessionEvent::Closed));
}

#[tokio::test]
async fn test_backend_unavailable_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = ScriptedRenderer::new().unavailable();
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let err = orch.acquire(&scenario_record()).await.unwrap_err();
    assert!(matches!(err, AcquireError::BackendUnavailable(_)));
}

// ── Search form ──

#[tokio::test]
async fn test_search_form_reaches_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = record("Circular", "3.682", "arranjos de pagamento");
    record.source_url = Some(format!("{PORTAL}/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=0"));
    let search = format!("{PORTAL}/estabilidadefinanceira/buscanormas");
    let results = format!("{search}?numero=3.682");
    let target = format!("{PORTAL}/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=3682");

    let renderer = ScriptedRenderer::new()
        .page(record.source_url.as_deref().unwrap(), stuck_page())
        .page(&search, PageScript::new().on_click("button.btn-primary", &results))
        .page(
            &results,
            PageScript::new()
                .region(".resultado-busca", "Circular 3.681", "<a href=\"/x\">Circular 3.681</a>")
                .region(
                    ".resultado-busca",
                    "Circular 3.682 de 4/11/2013",
                    "<a href=\"/estabilidadefinanceira/exibenormativo?tipo=Circular&amp;numero=3682\">Circular 3.682</a>",
                ),
        )
        .page(&target, document_page(1));
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::SearchForm);
    assert_eq!(result.origin_url, target);
    assert!(renderer.events().contains(&SessionEvent::Filled {
        selector: "#numero".into(),
        value: "3.682".into(),
    }));
}

#[tokio::test]
async fn test_sidecar_links_are_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let page = document_page(0)
        .region(
            "a[href*='.pdf'], a[href*='download']",
            "PDF",
            "<a href=\"/content/normativos/Res4734.pdf\">PDF</a>",
        )
        .region(
            "a[href*='.pdf'], a[href*='download']",
            "Baixar",
            "<a href=\"/download?id=1\">Baixar</a>",
        );
    let renderer = ScriptedRenderer::new().page(&url, page);
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(
        result.sidecar_links,
        vec![format!("{PORTAL}/content/normativos/Res4734.pdf")]
    );
    assert_eq!(Portal::new(PORTAL).document_url(&record), url);
}

#[tokio::test]
async fn test_search_redirect_renders_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = record("Circular", "4.100", "sistema de pagamentos");
    record.source_url = Some(format!("{PORTAL}/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=0"));
    let search = format!("{PORTAL}/estabilidadefinanceira/buscanormas");
    let results = format!("{search}?numero=4.100");
    let landing = format!("{PORTAL}/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=4100");

    let renderer = ScriptedRenderer::new()
        .page(record.source_url.as_deref().unwrap(), stuck_page())
        .page(
            &search,
            PageScript::new().on_click("button[title='Buscar conteúdo no site']", &results),
        )
        .page(&results, document_page(0).redirect_to(&landing));
    let config = Config {
        debug: true,
        ..fast_config(dir.path())
    };
    let mut orch = orchestrator(&renderer, &config);

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::SearchForm);
    assert_eq!(result.origin_url, landing);
    // the landing page is never requested again
    assert!(!renderer.navigations().contains(&landing));

    let stem = artifact_stem(&record.doc_type, &record.number, &record.subject);
    let snapshots = dir.path().join("debug");
    let events = renderer.events();
    for label in ["search", "search_form"] {
        let shot = snapshots.join(format!("{stem}_{label}.png"));
        assert!(events.contains(&SessionEvent::Snapshot(shot)), "missing {label} snapshot");
    }
}

// ── Readiness and text floor ──

#[tokio::test]
async fn test_document_without_articles_is_ready_on_first_poll() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let body = format!(
        "CARTA CIRCULAR Nº 4.100\nBANCO CENTRAL DO BRASIL\nBrasília, 2 de março de 2022. {}",
        filler(170)
    );
    let page = PageScript::new()
        .frames([format!("Home | ACESSIBILIDADE\n{body}")])
        .region(".documento-conteudo", body.clone(), "<div class=\"documento-conteudo\"></div>");
    let renderer = ScriptedRenderer::new().page(&url, page);
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Acquired(result) = orch.acquire(&record).await.unwrap() else {
        panic!("expected acquisition");
    };

    assert_eq!(result.strategy_used, Strategy::RegistryUrl);
    assert!(result.text.starts_with("CARTA CIRCULAR Nº 4.100"));
    let reads = renderer
        .events()
        .iter()
        .filter(|e| matches!(e, SessionEvent::TextRead))
        .count();
    assert_eq!(reads, 1);
}

#[tokio::test]
async fn test_whitespace_padding_does_not_pass_length_floor() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let padded = format!("CARTA CIRCULAR BANCO CENTRAL Brasília{}fim", " ".repeat(1500));
    let page = PageScript::new()
        .frames([rendered_page()])
        .region(".documento-conteudo", padded, "<div class=\"documento-conteudo\"></div>");
    let renderer = ScriptedRenderer::new().page(&url, page);
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    let Acquisition::Failed(failures) = orch.acquire(&record).await.unwrap() else {
        panic!("expected failure");
    };

    assert_eq!(failures[0].strategy, Strategy::RegistryUrl);
    assert_eq!(failures[0].kind, ErrorKind::ContentNotFound);
    assert!(failures[0].message.contains("too short"), "{}", failures[0].message);
}

// ── Debug snapshots ──

#[tokio::test]
async fn test_debug_mode_snapshots_each_render() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new().page(&url, document_page(0));
    let config = Config {
        debug: true,
        ..fast_config(dir.path())
    };
    let mut orch = orchestrator(&renderer, &config);

    orch.acquire(&record).await.unwrap();

    let events = renderer.events();
    assert_eq!(events[0], SessionEvent::Opened(RenderMode::Visible));
    let stem = artifact_stem(&record.doc_type, &record.number, &record.subject);
    let shot = dir.path().join("debug").join(format!("{stem}_registry_url.png"));
    assert!(events.contains(&SessionEvent::Snapshot(shot)));
    assert!(dir.path().join("debug").is_dir());
}

#[tokio::test]
async fn test_no_snapshots_outside_debug_mode() {
    let dir = tempfile::tempdir().unwrap();
    let record = scenario_record();
    let url = record.source_url.clone().unwrap();
    let renderer = ScriptedRenderer::new().page(&url, document_page(0));
    let mut orch = orchestrator(&renderer, &fast_config(dir.path()));

    orch.acquire(&record).await.unwrap();

    assert!(!renderer
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::Snapshot(_))));
    assert!(!dir.path().join("debug").exists());
}
