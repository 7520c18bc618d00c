// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn audio_priority_orders_high_above_low() {
    assert!(AudioPriority::High > AudioPriority::Normal);
    assert!(AudioPriority::Normal > AudioPriority::Low);
}

#[test]
fn ui_element_equality_considers_bounds() {
    let a = UiElement {
        role: "button".into(),
        label: "Submit".into(),
        bounds: Rect { x: 0, y: 0, width: 10, height: 10 },
        enabled: true,
    };
    let b = a.clone();
    assert_eq!(a, b);
}
