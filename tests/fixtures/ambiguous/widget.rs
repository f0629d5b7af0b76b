// Anchor for a component whose sidecar is ambiguous
