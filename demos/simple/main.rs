use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::json;

use apiflow::{ApiflowError, CrawlerBuilder, Definitions, SpecModel, Transport, TransportRequest, TransportResponse};

/// Stand-in for a live API so the demo runs without a server.
struct DemoApi;

#[async_trait]
impl Transport for DemoApi {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> apiflow::Result<TransportResponse> {
        println!("-> {} {}", request.method.as_upper(), request.url);

        let data = match request.url.as_str() {
            "/api/v1/org" => json!([{ "id": "0f1d", "name": "acme" }]),
            "/api/v1/org/0f1d/budget" => json!({ "totalCost": 120, "currency": "EUR" }),
            "/api/v1/budget" => json!({ "id": "b-77", "accepted": true }),
            other => {
                return Err(ApiflowError::Transport {
                    node: String::new(),
                    method: request.method.as_upper().to_string(),
                    url: other.to_string(),
                    message: "no such route".to_string(),
                });
            }
        };

        Ok(TransportResponse {
            status: 200,
            headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
            data,
        })
    }
}

#[tokio::main]
async fn main() {
    let crawler = CrawlerBuilder::new().transport(Arc::new(DemoApi)).build().unwrap();

    let spec = SpecModel::from_json(include_str!("./spec.json")).unwrap();

    let mut seed = Definitions::new();
    seed.insert("BudgetRequest".to_string(), json!({ "orgId": "$Organization[0].id", "limit": 500 }));

    let report = crawler.run(spec, seed).await.unwrap();

    println!("\n{}\n", report.graph.schema());
    println!("Resolved body definitions: {:#?}", report.definitions);
    println!("Annotated spec:\n{}", report.spec.to_json().unwrap());
}
