// Anchor for a component without a sidecar
