mod access;
mod support;
