//! HTTP surface: the public check-in form, the protected admin dashboard and
//! the JSON/xlsx endpoints behind it. Pages are embedded HTML, served as-is.

use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use actix_web_httpauth::extractors::basic::BasicAuth;
use chrono::Timelike;
use chrono_tz::America::Mexico_City;
use serde::Serialize;
use serde_json::json;

use crate::analytics;
use crate::catalog;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::export;
use crate::model::{RawRow, RegisterRequest, StatisticsBundle, StatsFilter};
use crate::normalizer;
use crate::store::Store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(pagina_registro))
        .route("/admin", web::get().to(pagina_admin))
        .route("/health", web::get().to(health))
        .route("/api/register", web::post().to(register))
        .route("/api/catalog", web::get().to(catalogo))
        .route("/api/stats", web::get().to(stats))
        .route("/api/export", web::get().to(exportar));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Registro CAA en línea")
}

async fn pagina_registro() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(PAGINA_REGISTRO)
}

async fn pagina_admin(
    config: web::Data<AppConfig>,
    auth: BasicAuth,
) -> Result<HttpResponse, ApiError> {
    check_admin(&config, &auth)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(PAGINA_ADMIN))
}

/// New check-in. The date and hour come from the server clock in
/// America/Mexico_City, never from the client, so aggregation keys stay
/// stable regardless of where the browser is.
async fn register(
    store: web::Data<Store>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    if req.nombre.trim().is_empty() || req.actividad.trim().is_empty() || req.sala.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Datos incompletos: nombre, actividad y sala son obligatorios".to_string(),
        ));
    }

    let ahora = chrono::Utc::now().with_timezone(&Mexico_City);
    let hora = ahora.hour() as u8;
    if !(analytics::HORA_APERTURA..=analytics::HORA_CIERRE).contains(&hora) {
        return Err(ApiError::Validation(
            "Hora fuera del rango permitido (el centro abre de 8 a 20)".to_string(),
        ));
    }

    let row = RawRow {
        nombre: req.nombre.trim().to_string(),
        matricula: req.matricula.trim().to_string(),
        actividad: req.actividad.trim().to_string(),
        sala: req.sala.trim().to_string(),
        fecha: ahora.format("%Y-%m-%d").to_string(),
        hora: ahora.format("%H:%M").to_string(),
    };
    store.append(&row).await?;
    tracing::info!(sala = %row.sala, actividad = %row.actividad, "registro guardado");

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn catalogo() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "salas": catalog::SALAS,
        "actividades": catalog::ACTIVIDADES,
        "actividades_por_sala": catalog::actividades_por_sala(),
    }))
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    bundle: StatisticsBundle,
    actividades_por_sala: BTreeMap<&'static str, Vec<&'static str>>,
}

async fn stats(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    auth: BasicAuth,
    query: web::Query<StatsFilter>,
) -> Result<HttpResponse, ApiError> {
    check_admin(&config, &auth)?;
    let filter = query.into_inner().tidy();

    let rows = store.list_all().await?;
    let records = normalizer::normalize_rows(&rows);
    let bundle = analytics::compute(&records, &filter);

    Ok(HttpResponse::Ok().json(StatsResponse {
        bundle,
        actividades_por_sala: catalog::actividades_por_sala(),
    }))
}

async fn exportar(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    auth: BasicAuth,
    query: web::Query<StatsFilter>,
) -> Result<HttpResponse, ApiError> {
    check_admin(&config, &auth)?;
    let filter = query.into_inner().tidy();

    let rows = store.list_all().await?;
    let records = normalizer::normalize_rows(&rows);
    let seleccion = analytics::project(&records, &filter);
    let buffer = export::build_workbook(&seleccion)?;
    let filename = export::nombre_reporte(filter.from.as_deref(), filter.to.as_deref());

    Ok(HttpResponse::Ok()
        .content_type(export::CONTENT_TYPE_XLSX)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(buffer))
}

fn check_admin(config: &AppConfig, auth: &BasicAuth) -> Result<(), ApiError> {
    let ok = auth.user_id() == config.admin_user.as_str()
        && auth.password() == Some(config.admin_password.as_str());
    if ok {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

const PAGINA_REGISTRO: &str = r##"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <title>Registro de asistencias - CAA</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }
        .contenedor { background: #f5f5f5; padding: 25px; border-radius: 10px; }
        .campo { margin: 15px 0; }
        label { display: block; margin-bottom: 5px; font-weight: bold; }
        input, select { width: 100%; padding: 10px; border: 1px solid #ddd; border-radius: 4px; }
        button { background: #007bff; color: white; padding: 12px 24px; border: none; border-radius: 4px; cursor: pointer; }
        button:hover { background: #0056b3; }
        .mensaje { margin-top: 15px; font-weight: bold; }
    </style>
</head>
<body>
    <div class="contenedor">
        <h1>Centro de Autoacceso - Registro de asistencia</h1>
        <form id="formaRegistro">
            <div class="campo">
                <label for="nombre">Nombre completo *</label>
                <input type="text" id="nombre" name="nombre" placeholder="Nombre del estudiante">
            </div>
            <div class="campo">
                <label for="matricula">Matrícula</label>
                <input type="text" id="matricula" name="matricula" placeholder="Opcional">
            </div>
            <div class="campo">
                <label for="sala">Sala *</label>
                <select id="sala" name="sala"></select>
            </div>
            <div class="campo">
                <label for="actividad">Actividad *</label>
                <select id="actividad" name="actividad"></select>
            </div>
            <button type="submit">Registrar asistencia</button>
            <p id="mensaje" class="mensaje"></p>
        </form>
    </div>

    <script>
        const forma = document.getElementById('formaRegistro');
        const mensaje = document.getElementById('mensaje');
        const selectSala = document.getElementById('sala');
        const selectActividad = document.getElementById('actividad');
        let catalogo = { salas: [], actividades: [], actividades_por_sala: {} };

        function llenarSelect(select, opciones, textoVacio) {
            select.innerHTML = '';
            const vacia = document.createElement('option');
            vacia.value = '';
            vacia.textContent = textoVacio;
            select.appendChild(vacia);
            opciones.forEach(valor => {
                const opcion = document.createElement('option');
                opcion.value = valor;
                opcion.textContent = valor;
                select.appendChild(opcion);
            });
        }

        async function cargarCatalogo() {
            const respuesta = await fetch('/api/catalog');
            catalogo = await respuesta.json();
            llenarSelect(selectSala, catalogo.salas, 'Seleccione una sala');
            llenarSelect(selectActividad, catalogo.actividades, 'Seleccione una actividad');
        }

        selectSala.addEventListener('change', () => {
            const opciones = catalogo.actividades_por_sala[selectSala.value] || catalogo.actividades;
            llenarSelect(selectActividad, opciones, 'Seleccione una actividad');
        });

        forma.addEventListener('submit', async (evento) => {
            evento.preventDefault();
            const datos = {
                nombre: document.getElementById('nombre').value.trim(),
                matricula: document.getElementById('matricula').value.trim(),
                actividad: selectActividad.value,
                sala: selectSala.value
            };
            if (!datos.nombre || !datos.actividad || !datos.sala) {
                mensaje.textContent = 'Por favor completa los campos obligatorios.';
                mensaje.style.color = 'red';
                return;
            }
            try {
                const respuesta = await fetch('/api/register', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(datos)
                });
                const resultado = await respuesta.json();
                if (respuesta.ok) {
                    mensaje.textContent = 'Registro exitoso';
                    mensaje.style.color = 'green';
                    forma.reset();
                } else {
                    mensaje.textContent = resultado.error || 'Error al registrar, intenta de nuevo.';
                    mensaje.style.color = 'red';
                }
            } catch (error) {
                mensaje.textContent = 'Error de conexión con el servidor.';
                mensaje.style.color = 'red';
            }
        });

        cargarCatalogo();
    </script>
</body>
</html>
"##;

const PAGINA_ADMIN: &str = r##"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <title>Panel de estadísticas - CAA</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <style>
        body { font-family: Arial, sans-serif; max-width: 900px; margin: 40px auto; padding: 20px; }
        .filtros { background: #f5f5f5; padding: 20px; border-radius: 10px; display: grid; grid-template-columns: repeat(5, 1fr); gap: 10px; align-items: end; }
        .filtros label { display: block; font-weight: bold; margin-bottom: 4px; }
        .filtros input, .filtros select { width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; }
        button { background: #007bff; color: white; padding: 10px 18px; border: none; border-radius: 4px; cursor: pointer; }
        button.exportar { background: #28a745; }
        .seccion { margin: 30px 0; }
        .resumen { background: #d1ecf1; color: #0c5460; padding: 15px; border-radius: 5px; }
        canvas { max-height: 320px; }
        .fila-calor { display: grid; grid-template-columns: 100px repeat(13, 1fr); gap: 2px; margin-bottom: 2px; align-items: center; }
        .fecha-calor { font-size: 12px; }
        .celda-calor { height: 22px; border-radius: 2px; }
        .nota { color: #666; font-size: 13px; }
    </style>
</head>
<body>
    <h1>Panel de estadísticas del CAA</h1>

    <div class="filtros">
        <div>
            <label for="sala">Sala</label>
            <select id="sala"></select>
        </div>
        <div>
            <label for="actividad">Actividad</label>
            <select id="actividad"></select>
        </div>
        <div>
            <label for="desde">Desde</label>
            <input type="date" id="desde">
        </div>
        <div>
            <label for="hasta">Hasta</label>
            <input type="date" id="hasta">
        </div>
        <div>
            <button id="btnCargar">Cargar</button>
            <button id="btnExportar" class="exportar">Exportar</button>
        </div>
    </div>

    <div class="seccion">
        <p id="resumen" class="resumen">Selecciona filtros y presiona Cargar.</p>
    </div>

    <div class="seccion">
        <h3>Actividades</h3>
        <canvas id="graficaActividades"></canvas>
    </div>

    <div class="seccion">
        <h3>Registros por hora (8 a 20)</h3>
        <canvas id="graficaHoras"></canvas>
    </div>

    <div class="seccion">
        <h3>Registros por día</h3>
        <canvas id="graficaDias"></canvas>
    </div>

    <div class="seccion">
        <h3>Mapa de calor</h3>
        <div id="mapaCalor"></div>
        <p class="nota">Concentración de asistencias por día y hora; colores más intensos indican más registros. Celdas ausentes valen cero.</p>
    </div>

    <script>
        // Cada vista es dueña de sus gráficas: al recargar se destruye la
        // instancia anterior antes de crear la nueva.
        function crearSesionGraficas() {
            const instancias = {};
            return {
                render(id, config) {
                    if (instancias[id]) instancias[id].destroy();
                    instancias[id] = new Chart(document.getElementById(id), config);
                }
            };
        }

        const sesion = crearSesionGraficas();
        const selectSala = document.getElementById('sala');
        const selectActividad = document.getElementById('actividad');
        let catalogo = { salas: [], actividades: [], actividades_por_sala: {} };

        function llenarSelect(select, opciones, textoVacio) {
            select.innerHTML = '';
            const vacia = document.createElement('option');
            vacia.value = '';
            vacia.textContent = textoVacio;
            select.appendChild(vacia);
            opciones.forEach(valor => {
                const opcion = document.createElement('option');
                opcion.value = valor;
                opcion.textContent = valor;
                select.appendChild(opcion);
            });
        }

        async function cargarCatalogo() {
            const respuesta = await fetch('/api/catalog');
            catalogo = await respuesta.json();
            llenarSelect(selectSala, catalogo.salas, 'Todas');
            llenarSelect(selectActividad, catalogo.actividades, 'Todas');
        }

        selectSala.addEventListener('change', () => {
            const opciones = catalogo.actividades_por_sala[selectSala.value] || catalogo.actividades;
            llenarSelect(selectActividad, opciones, 'Todas');
        });

        function parametros() {
            const params = new URLSearchParams();
            if (selectSala.value) params.set('sala', selectSala.value);
            if (selectActividad.value) params.set('actividad', selectActividad.value);
            const desde = document.getElementById('desde').value;
            const hasta = document.getElementById('hasta').value;
            if (desde) params.set('from', desde);
            if (hasta) params.set('to', hasta);
            return params;
        }

        function paleta(n) {
            const colores = [];
            for (let i = 0; i < n; i++) {
                colores.push('hsl(' + Math.round(i * 360 / Math.max(n, 1)) + ',70%,60%)');
            }
            return colores;
        }

        async function cargar() {
            const respuesta = await fetch('/api/stats?' + parametros().toString());
            const data = await respuesta.json();

            document.getElementById('resumen').textContent = data.resumen.textoResumen;

            const actividades = Object.keys(data.por_actividad);
            sesion.render('graficaActividades', {
                type: 'pie',
                data: {
                    labels: actividades,
                    datasets: [{ data: Object.values(data.por_actividad), backgroundColor: paleta(actividades.length) }]
                },
                options: {
                    plugins: {
                        tooltip: {
                            callbacks: {
                                label: function (contexto) {
                                    const pct = data.porcentajes.actividad[contexto.label];
                                    return contexto.label + ': ' + contexto.raw + ' registros (' + pct + '%)';
                                }
                            }
                        }
                    }
                }
            });

            sesion.render('graficaHoras', {
                type: 'bar',
                data: {
                    labels: Object.keys(data.por_hora).map(h => h + ':00'),
                    datasets: [{ label: 'Registros por hora', data: Object.values(data.por_hora) }]
                },
                options: { scales: { y: { beginAtZero: true } } }
            });

            sesion.render('graficaDias', {
                type: 'line',
                data: {
                    labels: Object.keys(data.por_dia),
                    datasets: [{ label: 'Registros por día', data: Object.values(data.por_dia), tension: 0.2 }]
                },
                options: { scales: { y: { beginAtZero: true } } }
            });

            pintarMapaCalor(data.mapa_calor);
        }

        function colorCalor(v) {
            const r = Math.floor(255 * v);
            const g = Math.floor(180 * (1 - v));
            const b = Math.floor(255 * (1 - v));
            return 'rgb(' + r + ',' + g + ',' + b + ')';
        }

        function pintarMapaCalor(mapa) {
            const contenedor = document.getElementById('mapaCalor');
            contenedor.innerHTML = '';
            const fechas = Object.keys(mapa);
            if (!fechas.length) {
                contenedor.textContent = 'No hay datos suficientes para el mapa de calor.';
                return;
            }
            let maximo = 0;
            fechas.forEach(fecha => {
                Object.values(mapa[fecha]).forEach(valor => { if (valor > maximo) maximo = valor; });
            });
            fechas.forEach(fecha => {
                const fila = document.createElement('div');
                fila.className = 'fila-calor';
                const etiqueta = document.createElement('span');
                etiqueta.className = 'fecha-calor';
                etiqueta.textContent = fecha;
                fila.appendChild(etiqueta);
                for (let hora = 8; hora <= 20; hora++) {
                    const celda = document.createElement('div');
                    const valor = (mapa[fecha] && mapa[fecha][hora]) || 0;
                    const intensidad = maximo ? valor / maximo : 0;
                    celda.className = 'celda-calor';
                    celda.style.backgroundColor = colorCalor(intensidad);
                    celda.title = fecha + ' ' + hora + ':00 - ' + valor + ' registros';
                    fila.appendChild(celda);
                }
                contenedor.appendChild(fila);
            });
        }

        document.getElementById('btnCargar').addEventListener('click', cargar);
        document.getElementById('btnExportar').addEventListener('click', () => {
            window.location.href = '/api/export?' + parametros().toString();
        });

        cargarCatalogo().then(cargar);
    </script>
</body>
</html>
"##;
