use std::sync::Arc;

use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateCustomer, CreateOrder, CreateProduct, CustomerService, OrderItemInput, OrderQuery,
    OrderService, ProductService, UpdateOrder,
};
use record_store::InMemoryStore;

struct Fixture {
    orders: OrderService<InMemoryStore>,
    customer_id: common::CustomerId,
    product_id: common::ProductId,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let customers = CustomerService::new(Arc::clone(&store));
    let products = ProductService::new(Arc::clone(&store));
    let orders = OrderService::new(Arc::clone(&store));

    let customer = customers
        .create(CreateCustomer::new("Bench", "bench@example.com"))
        .await
        .unwrap();
    let product = products
        .create(CreateProduct::new(
            "Widget",
            "WID-BENCH",
            Money::from_cents(2999),
            1000,
        ))
        .await
        .unwrap();

    Fixture {
        orders,
        customer_id: customer.id,
        product_id: product.id,
    }
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fx = rt.block_on(fixture());

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                fx.orders
                    .create(CreateOrder::new(
                        fx.customer_id,
                        vec![OrderItemInput::new(fx.product_id, 2)],
                    ))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_item_replacement(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fx = rt.block_on(fixture());
    let order = rt.block_on(async {
        fx.orders
            .create(CreateOrder::new(
                fx.customer_id,
                vec![OrderItemInput::new(fx.product_id, 2)],
            ))
            .await
            .unwrap()
    });

    c.bench_function("domain/update_replace_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                fx.orders
                    .update(
                        order.order.id,
                        UpdateOrder {
                            items: Some(vec![OrderItemInput::with_price(
                                fx.product_id,
                                1,
                                Money::from_cents(1999),
                            )]),
                            ..UpdateOrder::default()
                        },
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_list_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fx = rt.block_on(fixture());

    rt.block_on(async {
        for _ in 0..200 {
            fx.orders
                .create(CreateOrder::new(
                    fx.customer_id,
                    vec![OrderItemInput::new(fx.product_id, 1)],
                ))
                .await
                .unwrap();
        }
    });

    c.bench_function("domain/list_orders_200", |b| {
        b.iter(|| {
            rt.block_on(async {
                let page = fx
                    .orders
                    .find_all(OrderQuery {
                        limit: 20,
                        ..OrderQuery::default()
                    })
                    .await
                    .unwrap();
                assert_eq!(page.data.len(), 20);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_item_replacement,
    bench_list_orders,
);
criterion_main!(benches);
