//! HTTP client for the product service, used by the `product-client` binary.
//!
//! Talks plain JSON over HTTP; entity links are made through `$ref` exactly as any other client would.

use reqwest::{Client, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use crate::api::models::{
    products::{ProductCreate, ProductResponse},
    references::EntityReference,
    suppliers::{SupplierCreate, SupplierResponse},
};
use crate::errors::ErrorBody;
use crate::types::{EntitySet, ProductId};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The service answered with an error body
    #[error("{status} {code}: {message}")]
    Service { status: StatusCode, code: String, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// A created entity together with where the service says it lives
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub status: StatusCode,
    pub location: Option<String>,
    pub entity: T,
}

#[derive(Debug, Clone)]
pub struct ProductClient {
    http: Client,
    root: Url,
}

impl ProductClient {
    pub fn new(service_url: Url) -> Self {
        let mut root = service_url;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Self { http: Client::new(), root }
    }

    pub fn service_root(&self) -> &Url {
        &self.root
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.root.join(path)?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let (code, message) = match response.json::<ErrorBody>().await {
            Ok(body) => (body.error.code, body.error.message),
            Err(_) => ("Unknown".to_string(), status.canonical_reason().unwrap_or_default().to_string()),
        };
        Err(ClientError::Service { status, code, message })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<Created<T>> {
        let response = Self::check(self.http.post(self.url(path)?).json(body).send().await?).await?;
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let entity = response.json().await?;
        Ok(Created { status, location, entity })
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_supplier(&self, name: &str) -> Result<Created<SupplierResponse>> {
        let body = SupplierCreate {
            id: None,
            name: name.to_string(),
        };
        self.post(EntitySet::Suppliers.name(), &body).await
    }

    #[tracing::instrument(skip_all, fields(name = %product.name))]
    pub async fn create_product(&self, product: &ProductCreate) -> Result<Created<ProductResponse>> {
        self.post(EntitySet::Products.name(), product).await
    }

    /// Link a product to a supplier through `Products(k)/Supplier/$ref`
    #[tracing::instrument(skip(self))]
    pub async fn link_supplier(&self, product_id: ProductId, supplier_uri: &str) -> Result<StatusCode> {
        let body = EntityReference {
            odata_id: supplier_uri.to_string(),
        };
        let url = self.url(&format!("{}({product_id})/Supplier/$ref", EntitySet::Products))?;
        let response = Self::check(self.http.put(url).json(&body).send().await?).await?;
        Ok(response.status())
    }

    /// Every product with its supplier inlined
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>> {
        let mut url = self.url(EntitySet::Products.name())?;
        url.query_pairs_mut().append_pair("$expand", "Supplier");
        let response = Self::check(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }
}

/// One listing line: `name price category supplierName`
pub fn format_product_line(product: &ProductResponse) -> String {
    let supplier = product.supplier.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
    format!("{} {} {} {}", product.name, product.price, product.category, supplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_state;
    use rust_decimal::Decimal;
    use tokio::net::TcpListener;

    async fn spawn_service() -> ProductClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let mut state = create_test_state();
        state.config.public_url = Some(Url::parse(&format!("http://{address}/")).unwrap());
        let router = crate::build_router(state).unwrap();
        tokio::spawn(async move { axum::serve(listener, router.into_make_service()).await });

        ProductClient::new(Url::parse(&format!("http://{address}")).unwrap())
    }

    #[test]
    fn test_root_gets_trailing_slash() {
        let client = ProductClient::new(Url::parse("http://localhost:18003/odata").unwrap());
        assert_eq!(client.service_root().as_str(), "http://localhost:18003/odata/");
    }

    #[tokio::test]
    async fn test_seed_and_list_through_http() {
        let client = spawn_service().await;

        let supplier = client.create_supplier("Duncan").await.unwrap();
        assert_eq!(supplier.status, StatusCode::CREATED);
        let supplier_uri = supplier.location.clone().unwrap();
        assert!(supplier_uri.ends_with("/Suppliers(1)"));

        let product = client
            .create_product(&ProductCreate {
                id: None,
                name: "Yo-yo".to_string(),
                price: Decimal::new(495, 2),
                category: "Toys".to_string(),
                supplier_id: None,
            })
            .await
            .unwrap();
        assert_eq!(client.link_supplier(product.entity.id, &supplier_uri).await.unwrap(), StatusCode::NO_CONTENT);

        let products = client.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, Decimal::new(495, 2));
        let line = format_product_line(&products[0]);
        assert!(line.starts_with("Yo-yo "));
        assert!(line.ends_with(" Toys Duncan"));
    }

    #[tokio::test]
    async fn test_service_errors_are_typed() {
        let client = spawn_service().await;

        let err = client.link_supplier(42, "Suppliers(1)").await.unwrap_err();
        match err {
            ClientError::Service { status, code, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(code, "NotFound");
            }
            other => panic!("expected a service error, got {other:?}"),
        }
    }
}
