// Anchor for the issue link component
