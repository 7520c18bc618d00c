// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    permission_denied = { ErrorKind::PermissionDenied, false },
    extraction_timeout = { ErrorKind::ExtractionTimeout, true },
    module_unavailable = { ErrorKind::ModuleUnavailable, true },
    element_not_found = { ErrorKind::ElementNotFound, false },
)]
fn retryable(kind: ErrorKind, expected: bool) {
    assert_eq!(kind.retryable(), expected);
}

#[test]
fn permission_denied_never_falls_back() {
    assert!(!ErrorKind::PermissionDenied.allows_fallback());
    assert!(ErrorKind::ElementNotFound.allows_fallback());
}

#[test]
fn handler_error_defaults_recoverable_from_kind() {
    let err = HandlerError::new(ErrorKind::ExtractionFailed, "boom");
    assert!(err.recoverable);
    let err = HandlerError::new(ErrorKind::PermissionDenied, "denied");
    assert!(!err.recoverable);
}

#[test]
fn display_includes_kind_and_message() {
    let err = HandlerError::new(ErrorKind::LockTimeout, "system busy");
    assert_eq!(err.to_string(), "LOCK_TIMEOUT: system busy");
}
