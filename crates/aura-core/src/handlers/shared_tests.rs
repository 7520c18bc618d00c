// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};

use super::*;
use crate::collaborators::BoxFuture;
use crate::error::ErrorKind;

struct FakeAccessibility {
    frontmost: Result<String, HandlerError>,
}

impl AccessibilityClient for FakeAccessibility {
    fn frontmost_app(&self) -> BoxFuture<'_, Result<String, HandlerError>> {
        let result = self.frontmost.clone();
        Box::pin(async move { result })
    }

    fn find_element(
        &self,
        _label: &str,
    ) -> BoxFuture<'_, Result<Option<crate::collaborators::UiElement>, HandlerError>> {
        Box::pin(async { Ok(None) })
    }

    fn list_elements(&self) -> BoxFuture<'_, Result<Vec<crate::collaborators::UiElement>, HandlerError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[tokio::test]
async fn detect_active_app_prefers_accessibility_result() {
    let accessibility = FakeAccessibility { frontmost: Ok("Finder".into()) };
    let app = detect_active_app(&accessibility, "unknown").await.unwrap();
    assert_eq!(app, "Finder");
}

#[tokio::test]
async fn detect_active_app_falls_back_to_configured_default() {
    let accessibility =
        FakeAccessibility { frontmost: Err(HandlerError::new(ErrorKind::ModuleUnavailable, "down")) };
    let app = detect_active_app(&accessibility, "unknown").await.unwrap();
    assert_eq!(app, "unknown");
}

#[tokio::test]
async fn retry_with_backoff_retries_retryable_errors_then_succeeds() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, HandlerError> = retry_with_backoff(2, Duration::from_millis(1), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(HandlerError::new(ErrorKind::ExtractionTimeout, "timeout"))
            } else {
                Ok(n)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_with_backoff_stops_immediately_on_non_retryable_error() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, HandlerError> = retry_with_backoff(2, Duration::from_millis(1), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(HandlerError::new(ErrorKind::PermissionDenied, "denied")) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retry_with_backoff_exhausts_after_max_retries() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, HandlerError> = retry_with_backoff(2, Duration::from_millis(1), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(HandlerError::new(ErrorKind::ExtractionTimeout, "timeout")) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn label_similarity_scores_identical_strings_at_100() {
    assert_eq!(label_similarity("Gmail", "gmail"), 100);
}

#[test]
fn label_similarity_scores_dissimilar_strings_low() {
    assert!(label_similarity("Gmail", "Settings") < 50);
}
