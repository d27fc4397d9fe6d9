// Upstream JSON bodies, shaped like the marketplace REST API answers them.

use serde_json::{json, Value};

pub fn booking_json(id: i64, client: i64, date: &str, total: &str) -> Value {
    json!({
        "id": id,
        "cliente": client,
        "fecha": date,
        "hora": "10:00:00",
        "estado": "confirmada",
        "total_estimado": total
    })
}

pub fn booking_with_items(id: i64, client: i64, date: &str, total: &str, items: Value) -> Value {
    let mut booking = booking_json(id, client, date, total);
    booking["reserva_servicios"] = items;
    booking
}

pub fn line_item_json(service: i64, quantity: i64, unit_price: &str, subtotal: &str) -> Value {
    json!({
        "servicio": service,
        "cantidad": quantity,
        "precio_unitario": unit_price,
        "subtotal": subtotal
    })
}

pub fn service_json(id: i64, name: &str, price: &str, provider: i64, category: i64) -> Value {
    json!({
        "id": id,
        "nombre_servicio": name,
        "precio": price,
        "proveedor": provider,
        "categoria": category,
        "rating_promedio": 0
    })
}

pub fn provider_json(id: i64, name: &str, city: &str) -> Value {
    json!({
        "id": id,
        "nombre": name,
        "ubicacion": {"id": id * 100, "ciudad": city}
    })
}

pub fn client_json(id: i64, name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "nombre": name,
        "email": email
    })
}

pub fn rating_json(id: i64, service: i64, score: i64, date: &str) -> Value {
    json!({
        "id": id,
        "servicio": service,
        "cliente": 1,
        "puntuacion": score,
        "fecha": date
    })
}

/// Wrap a list the way paginated upstream endpoints do
pub fn paged(results: Value) -> Value {
    let count = results.as_array().map_or(0, Vec::len);
    json!({
        "count": count,
        "next": null,
        "previous": null,
        "results": results
    })
}
