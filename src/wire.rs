use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: ?Sized> {
    pub query: &'a str,
    pub variables: Option<&'a V>,
}
